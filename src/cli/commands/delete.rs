//! `lockguardium delete` — remove a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{log_audit, open_vault, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: u64, force: bool) -> Result<()> {
    let mut store = open_vault(cli)?;
    let service = store.get_record(id)?.service.clone();

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete #{id} {service}?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    store.delete_record(id)?;

    log_audit(cli, "delete", Some(id), Some(&service));
    output::success(&format!("Deleted #{id} {service}"));

    Ok(())
}
