//! Per-vault salt, persisted as a raw 16-byte file beside the vault.
//!
//! The salt is written exactly once, when the vault is first created.
//! Losing it makes every derived key unrecoverable, even with the right
//! master password, so nothing in this module overwrites an existing salt.

use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::atomic::write_atomic;
use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// A 16-byte random salt for Argon2id.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Generate a fresh salt from the OS CSPRNG.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| VaultError::KeyDerivationFailed(format!("OS RNG unavailable: {e}")))?;
        Ok(Self(bytes))
    }

    /// Wrap raw bytes, rejecting anything that is not exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SALT_LEN] = bytes.try_into().map_err(|_| {
            VaultError::CorruptSalt(format!(
                "expected {SALT_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Salt(..)")
    }
}

/// Read the salt at `path`, creating it on first use.
pub fn load_or_create(path: &Path) -> Result<Salt> {
    if path.exists() {
        return load(path);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| VaultError::PersistenceError(format!("create data dir: {e}")))?;
        }
    }

    let salt = Salt::generate()?;
    write_atomic(path, salt.as_bytes())
        .map_err(|e| VaultError::PersistenceError(format!("write salt: {e}")))?;
    tracing::info!(path = %path.display(), "created new vault salt");

    Ok(salt)
}

/// Read an existing salt.  A missing file is as fatal as a damaged one.
pub fn load(path: &Path) -> Result<Salt> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::CorruptSalt(format!(
                "salt file missing at {}",
                path.display()
            )));
        }
        Err(e) => {
            return Err(VaultError::CorruptSalt(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    Salt::from_slice(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_salt_once_and_rereads_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("salt.bin");

        let first = load_or_create(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), SALT_LEN);

        let second = load_or_create(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("salt.bin");

        load_or_create(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn wrong_length_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("salt.bin");
        fs::write(&path, [7u8; 15]).unwrap();

        let result = load_or_create(&path);
        assert!(matches!(result, Err(VaultError::CorruptSalt(_))));

        // The damaged file must not be replaced behind the user's back.
        assert_eq!(fs::read(&path).unwrap().len(), 15);
    }

    #[test]
    fn load_fails_when_missing() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("salt.bin"));
        assert!(matches!(result, Err(VaultError::CorruptSalt(_))));
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(Salt::generate().unwrap(), Salt::generate().unwrap());
    }

    #[test]
    fn debug_does_not_print_bytes() {
        let salt = Salt::from_slice(&[0xAB; SALT_LEN]).unwrap();
        assert_eq!(format!("{salt:?}"), "Salt(..)");
    }
}
