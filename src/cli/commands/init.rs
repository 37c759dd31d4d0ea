//! `lockguardium init` — create a new, empty vault.

use crate::cli::output;
use crate::cli::{log_audit, prompt_new_password, Cli, PASSWORD_ENV};
use crate::errors::{Result, VaultError};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let paths = cli.paths();

    // 1. Refuse to clobber an existing vault.
    if paths.vault_exists() {
        output::tip("Use `lockguardium add` to add credentials to the existing vault.");
        return Err(VaultError::VaultAlreadyExists(
            paths.vault_file().to_path_buf(),
        ));
    }

    // 2. Load settings before prompting so a bad config fails fast.
    let settings = cli.settings()?;

    // 3. Prompt for a new password (with confirmation).
    let password = prompt_new_password(PASSWORD_ENV)?;

    // 4. First unlock creates the salt and an empty vault file.
    let store = VaultStore::unlock(&paths, password.as_bytes(), &settings.argon2_params())?;
    output::success(&format!(
        "Vault created at {}",
        paths.vault_file().display()
    ));
    store.lock();

    log_audit(cli, "init", None, Some("vault created"));

    output::tip("Run `lockguardium add --service <NAME>` to add a credential.");
    output::tip("Run `lockguardium shell` for an interactive session.");

    Ok(())
}
