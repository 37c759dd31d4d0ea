//! `lockguardium import` — replace the vault with an exported one.

use std::path::Path;

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{log_audit, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::import_vault;

/// Execute the `import` command.
pub fn execute(cli: &Cli, dir: &Path, force: bool) -> Result<()> {
    let paths = cli.paths();

    if paths.vault_exists() && !force {
        let confirmed = Confirm::new()
            .with_prompt("This replaces the current vault and all its credentials. Continue?")
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    import_vault(&paths, dir)?;

    log_audit(cli, "import", None, Some(&dir.display().to_string()));
    output::success(&format!("Imported vault from {}", dir.display()));
    output::tip("Unlock it with the master password it was exported with.");

    Ok(())
}
