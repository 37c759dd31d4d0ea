//! `lockguardium version` — display version and build information.

use console::style;

use crate::errors::Result;
use crate::vault::format::CURRENT_VERSION;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("lockguardium {current}");
    println!(
        "  {} {}",
        style("vault format:").dim(),
        CURRENT_VERSION
    );
    println!(
        "  {} {}",
        style("audit log:").dim(),
        if cfg!(feature = "audit-log") {
            style("enabled").green()
        } else {
            style("disabled").yellow()
        }
    );

    Ok(())
}
