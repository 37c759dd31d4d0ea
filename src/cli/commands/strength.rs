//! `lockguardium strength` — rate a password without storing it.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::errors::{Result, VaultError};
use crate::generator::calculate_strength;

/// Execute the `strength` command.
pub fn execute(password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(pw) => Zeroizing::new(pw.to_string()),
        None => Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Password to check")
                .allow_empty_password(true)
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        ),
    };

    output::print_strength(&calculate_strength(&password));

    Ok(())
}
