//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Parameters are configurable via `Argon2Params`
//! (loaded from `lockguardium.toml` or sensible defaults) and are stored
//! in the vault header so a vault always re-opens with the settings it
//! was created with.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::keys::{MasterKey, KEY_LEN};
use super::salt::Salt;
use crate::errors::{Result, VaultError};

/// Minimum safe memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Largest memory cost accepted, in KiB (4 GiB).
pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Most Argon2 passes accepted.
pub const MAX_ITERATIONS: u32 = 64;

/// Most Argon2 lanes accepted.
pub const MAX_PARALLELISM: u32 = 64;

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// The cheapest parameters that still pass validation.  Tests only.
    pub const fn minimum() -> Self {
        Self {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Reject settings that are too weak to protect the vault, or so
    /// large that deriving a key would exhaust the machine.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(VaultError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(VaultError::KeyDerivationFailed(format!(
                "Argon2 iterations must be between 1 and {MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(VaultError::KeyDerivationFailed(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// Derive the 32-byte master key from a password and the vault salt.
///
/// The same password + salt + params always produce the same key, which
/// is what lets unlock verify a password by trying to authenticate the
/// vault instead of comparing against a stored hash.
pub fn derive_key(password: &[u8], salt: &Salt, argon2_params: &Argon2Params) -> Result<MasterKey> {
    argon2_params.validate()?;

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    let master = MasterKey::new(key);
    key.zeroize();
    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(Argon2Params::default().validate().is_ok());
        assert!(Argon2Params::minimum().validate().is_ok());
    }

    #[test]
    fn rejects_weak_memory_cost() {
        let params = Argon2Params {
            memory_kib: 1024,
            ..Argon2Params::minimum()
        };
        let salt = Salt::from_slice(&[1u8; 16]).unwrap();
        let result = derive_key(b"pw", &salt, &params);
        assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
    }

    #[test]
    fn rejects_zero_iterations_and_lanes() {
        let no_iter = Argon2Params {
            iterations: 0,
            ..Argon2Params::minimum()
        };
        let no_lanes = Argon2Params {
            parallelism: 0,
            ..Argon2Params::minimum()
        };
        assert!(no_iter.validate().is_err());
        assert!(no_lanes.validate().is_err());
    }

    #[test]
    fn rejects_oversized_params() {
        let huge_memory = Argon2Params {
            memory_kib: 4_000_000_000,
            ..Argon2Params::minimum()
        };
        let many_passes = Argon2Params {
            iterations: MAX_ITERATIONS + 1,
            ..Argon2Params::minimum()
        };
        let many_lanes = Argon2Params {
            parallelism: MAX_PARALLELISM + 1,
            ..Argon2Params::minimum()
        };
        assert!(huge_memory.validate().is_err());
        assert!(many_passes.validate().is_err());
        assert!(many_lanes.validate().is_err());

        let largest = Argon2Params {
            memory_kib: MAX_MEMORY_KIB,
            iterations: MAX_ITERATIONS,
            parallelism: MAX_PARALLELISM,
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn params_survive_json() {
        let params = Argon2Params {
            memory_kib: 16_384,
            iterations: 2,
            parallelism: 1,
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: Argon2Params = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
