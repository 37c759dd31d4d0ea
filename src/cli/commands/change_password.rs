//! `lockguardium change-password` — change the vault master password.
//!
//! Unlocks with the current password, re-encrypts every record under a
//! key derived from the new password (same salt), and writes the vault
//! atomically.  Either the whole vault moves to the new password or
//! nothing changes.

use crate::cli::output;
use crate::cli::{log_audit, open_vault, prompt_new_password, Cli, NEW_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `change-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    // 1. Open the vault with the current password.
    output::info("Enter your current master password.");
    let mut store = open_vault(cli)?;

    // 2. Prompt for the new password.
    output::info("Choose your new master password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    // 3. Re-encrypt and swap.
    store.change_password(new_password.as_bytes())?;

    log_audit(
        cli,
        "change-password",
        None,
        Some(&format!("{} records re-encrypted", store.len())),
    );
    output::success(&format!(
        "Master password changed ({} credential(s) re-encrypted)",
        store.len()
    ));

    Ok(())
}
