//! `lockguardium export` — copy the encrypted vault and its salt to a
//! directory (backup or transfer).  Nothing is decrypted.

use std::path::Path;

use crate::cli::output;
use crate::cli::{log_audit, Cli};
use crate::errors::Result;
use crate::vault::export_vault;

/// Execute the `export` command.
pub fn execute(cli: &Cli, dir: &Path) -> Result<()> {
    export_vault(&cli.paths(), dir)?;

    log_audit(cli, "export", None, Some(&dir.display().to_string()));
    output::success(&format!("Exported vault to {}", dir.display()));
    output::tip("The export opens with the same master password as this vault.");

    Ok(())
}
