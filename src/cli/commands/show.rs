//! `lockguardium show` — print one credential, password included.

use crate::cli::output;
use crate::cli::{log_audit, open_vault, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: u64) -> Result<()> {
    let store = open_vault(cli)?;
    let record = store.get_record(id)?;

    output::print_record_detail(record);
    log_audit(cli, "show", Some(id), None);

    Ok(())
}
