//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::{self, Settings};
use crate::errors::{Result, VaultError};
use crate::vault::{VaultPaths, VaultStore};

/// Minimum password length to prevent trivially weak master passwords.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "LOCKGUARDIUM_PASSWORD";

/// Environment variable holding the new master password for
/// `change-password` in scripted use.
pub const NEW_PASSWORD_ENV: &str = "LOCKGUARDIUM_NEW_PASSWORD";

/// LockGuardium CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "lockguardium",
    about = "Local encrypted credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the vault, salt, config and audit log
    #[arg(long, global = true, env = "LOCKGUARDIUM_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Add a credential
    Add {
        /// Service or site name (e.g. GitHub)
        #[arg(short, long)]
        service: String,
        /// Account email
        #[arg(short, long, default_value = "")]
        email: String,
        /// Username
        #[arg(short, long, default_value = "")]
        username: String,
        /// Password (omit for interactive prompt)
        #[arg(short, long, conflicts_with = "generate")]
        password: Option<String>,
        /// Generate a random password instead of prompting
        #[arg(short, long)]
        generate: bool,
    },

    /// Show one credential, including its password
    Show {
        /// Record id (see `list`)
        id: u64,
    },

    /// List credentials
    List {
        /// Only show records whose service, email or username contains this text
        #[arg(long)]
        search: Option<String>,
        /// Sort order: service, created or modified
        #[arg(long)]
        sort: Option<String>,
    },

    /// Change fields of a credential
    Update {
        /// Record id
        id: u64,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete a credential
    Delete {
        /// Record id
        id: u64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the vault's master password
    ChangePassword,

    /// Copy the vault and its salt into a directory
    Export {
        /// Destination directory
        dir: PathBuf,
    },

    /// Replace the vault with one exported earlier
    Import {
        /// Directory containing vault.lgv and salt.bin
        dir: PathBuf,
        /// Skip the overwrite confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Interactive session with auto-lock
    Shell,

    /// Generate a random password
    Generate {
        /// Password length (default from config, 16)
        #[arg(short, long)]
        length: Option<usize>,
        #[arg(long)]
        no_uppercase: bool,
        #[arg(long)]
        no_lowercase: bool,
        #[arg(long)]
        no_digits: bool,
        #[arg(long)]
        no_symbols: bool,
    },

    /// Rate a password's strength (prompts if omitted)
    Strength {
        password: Option<String>,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum, ignore_case = true)]
        shell: clap_complete::Shell,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// The data directory from `--data-dir` / `LOCKGUARDIUM_DIR`, or the
    /// platform default.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(config::default_data_dir)
    }

    pub fn paths(&self) -> VaultPaths {
        VaultPaths::new(self.resolve_data_dir())
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.resolve_data_dir())
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the master password, trying in order:
/// 1. `LOCKGUARDIUM_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// `env_var` is checked first for scripted usage.  Enforces a minimum
/// password length.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            let pw = Zeroizing::new(pw);
            check_password_length(&pw)?;
            return Ok(pw);
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if let Err(e) = check_password_length(&password) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(password);
    }
}

/// Reject master passwords shorter than `MIN_PASSWORD_LEN` characters.
pub fn check_password_length(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VaultError::CommandFailed(format!(
            "master password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Open the existing vault, prompting for the master password.
///
/// Fails with `VaultNotFound` instead of silently creating a vault.
pub fn open_vault(cli: &Cli) -> Result<VaultStore> {
    let paths = cli.paths();
    if !paths.vault_exists() {
        output::tip("Run `lockguardium init` to create a vault.");
        return Err(VaultError::VaultNotFound(paths.vault_file().to_path_buf()));
    }

    let settings = cli.settings()?;
    let password = prompt_password()?;
    let store = VaultStore::unlock(&paths, password.as_bytes(), &settings.argon2_params());
    if matches!(store, Err(VaultError::WrongPassword)) {
        log_audit(cli, "unlock-failed", None, None);
    }
    store
}

/// Read a record secret from the prompt (hidden, confirmed).
pub fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let secret = dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(secret))
}

/// Log an audit event.  A no-op when built without the `audit-log` feature.
pub fn log_audit(cli: &Cli, op: &str, record_id: Option<u64>, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(cli, op, record_id, details);

    #[cfg(not(feature = "audit-log"))]
    let _ = (cli, op, record_id, details);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_counts_characters() {
        assert!(check_password_length("short").is_err());
        assert!(check_password_length("exactly8").is_ok());
        // Eight multi-byte characters.
        assert!(check_password_length("éééééééé").is_ok());
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cli = Cli::parse_from(["lockguardium", "--data-dir", "/tmp/lg", "list"]);
        assert_eq!(cli.resolve_data_dir(), PathBuf::from("/tmp/lg"));
        assert_eq!(
            cli.paths().vault_file(),
            std::path::Path::new("/tmp/lg/vault.lgv")
        );
    }

    #[test]
    fn generate_conflicts_with_password() {
        let parsed = Cli::try_parse_from([
            "lockguardium",
            "add",
            "--service",
            "x",
            "--password",
            "pw",
            "--generate",
        ]);
        assert!(parsed.is_err());
    }
}
