//! Where a vault lives on disk, and bulk export/import of it.
//!
//! A vault installation is a directory holding two files that always
//! travel together: `vault.lgv` (records) and `salt.bin` (KDF salt).
//! Export and import copy both verbatim; no re-encryption is needed
//! because the key is re-derived from the same password and salt.

use std::fs;
use std::path::{Path, PathBuf};

use crate::atomic::write_atomic;
use crate::crypto::salt::{self, Salt};
use crate::errors::{Result, VaultError};

use super::format;

/// File name of the encrypted records file.
pub const VAULT_FILE: &str = "vault.lgv";

/// File name of the raw salt file.
pub const SALT_FILE: &str = "salt.bin";

/// Lifecycle state of a vault as seen from disk.
///
/// `Unlocked` is not listed: an unlocked vault is an in-memory
/// `VaultStore` handle, not something the filesystem can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    /// No vault file yet; the next unlock creates one.
    Uninitialized,
    /// A vault file exists and needs the master password.
    Locked,
}

/// File locations for one vault installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    data_dir: PathBuf,
    vault_file: PathBuf,
    salt_file: PathBuf,
}

impl VaultPaths {
    /// Standard layout inside `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            vault_file: data_dir.join(VAULT_FILE),
            salt_file: data_dir.join(SALT_FILE),
            data_dir,
        }
    }

    /// Explicit locations, for callers that keep the files apart.
    pub fn with_files(
        data_dir: impl Into<PathBuf>,
        vault_file: impl Into<PathBuf>,
        salt_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            vault_file: vault_file.into(),
            salt_file: salt_file.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn vault_file(&self) -> &Path {
        &self.vault_file
    }

    pub fn salt_file(&self) -> &Path {
        &self.salt_file
    }

    /// `true` when a vault file exists (returning user).
    pub fn vault_exists(&self) -> bool {
        self.vault_file.exists()
    }

    pub fn status(&self) -> VaultStatus {
        if self.vault_exists() {
            VaultStatus::Locked
        } else {
            VaultStatus::Uninitialized
        }
    }

    /// Create the data directory with owner-only permissions.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)
                .map_err(|e| VaultError::PersistenceError(format!("create data dir: {e}")))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = fs::Permissions::from_mode(0o700);
                fs::set_permissions(&self.data_dir, perms).map_err(|e| {
                    VaultError::PersistenceError(format!("set data dir permissions: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Copy the vault file and its salt into `dest_dir`.
///
/// Refuses to overwrite a vault that already sits in `dest_dir`.
pub fn export_vault(paths: &VaultPaths, dest_dir: &Path) -> Result<()> {
    if !paths.vault_exists() {
        return Err(VaultError::VaultNotFound(paths.vault_file().to_path_buf()));
    }

    // Read both first so a damaged installation is never exported.
    let salt = salt::load(paths.salt_file())?;
    let vault_bytes = fs::read(paths.vault_file())?;
    format::parse_vault(&vault_bytes)?;

    let dest = VaultPaths::new(dest_dir);
    if dest.vault_exists() {
        return Err(VaultError::VaultAlreadyExists(dest.vault_file().to_path_buf()));
    }
    dest.ensure_data_dir()?;

    write_atomic(dest.salt_file(), salt.as_bytes())
        .map_err(|e| VaultError::PersistenceError(format!("export salt: {e}")))?;
    write_atomic(dest.vault_file(), &vault_bytes)
        .map_err(|e| VaultError::PersistenceError(format!("export vault: {e}")))?;

    tracing::info!(dest = %dest_dir.display(), "exported vault");
    Ok(())
}

/// Install the vault found in `src_dir`, replacing the current one.
///
/// The source is validated before anything is written: the salt must be
/// exactly 16 bytes and the vault file must parse.  Its MAC can only be
/// checked with the password, which happens at the next unlock.
pub fn import_vault(paths: &VaultPaths, src_dir: &Path) -> Result<()> {
    let src = VaultPaths::new(src_dir);
    if !src.vault_exists() {
        return Err(VaultError::VaultNotFound(src.vault_file().to_path_buf()));
    }

    let salt: Salt = salt::load(src.salt_file())?;
    let vault_bytes = fs::read(src.vault_file())?;
    format::parse_vault(&vault_bytes)?;

    paths.ensure_data_dir()?;

    // The live vault is only readable with the live salt, so keep a copy
    // and put it back if the vault itself cannot be replaced.
    let previous_salt = match fs::read(paths.salt_file()) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    write_atomic(paths.salt_file(), salt.as_bytes())
        .map_err(|e| VaultError::PersistenceError(format!("import salt: {e}")))?;
    if let Err(e) = write_atomic(paths.vault_file(), &vault_bytes) {
        restore_salt(paths, previous_salt.as_deref());
        return Err(VaultError::PersistenceError(format!("import vault: {e}")));
    }

    tracing::info!(src = %src_dir.display(), "imported vault");
    Ok(())
}

/// Put the salt back the way it was before a failed import.
fn restore_salt(paths: &VaultPaths, previous: Option<&[u8]>) {
    let restored = match previous {
        Some(bytes) => write_atomic(paths.salt_file(), bytes),
        None => fs::remove_file(paths.salt_file()),
    };
    if let Err(e) = restored {
        tracing::warn!(error = %e, "could not restore the salt after a failed import");
    }
}
