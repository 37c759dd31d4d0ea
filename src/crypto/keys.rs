//! Sub-key derivation using HKDF-SHA256.
//!
//! From a single master key we derive:
//! - A unique **per-record** encryption key for each record id.
//! - A dedicated **HMAC key** for vault integrity checks.
//!
//! HKDF (RFC 5869) uses the master key as input keying material (IKM)
//! and a context string (`info`) to produce independent sub-keys.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of the master key and every derived sub-key (256 bits).
pub const KEY_LEN: usize = 32;

/// Derive the encryption key for the fields of record `record_id`.
///
/// Binding the key to the id means a ciphertext copied into another
/// record fails authentication instead of decrypting.
pub fn derive_record_key(master_key: &[u8], record_id: u64) -> Result<[u8; KEY_LEN]> {
    let info = format!("lockguardium-record:{record_id}");
    hkdf_derive(master_key, info.as_bytes())
}

/// Derive the HMAC key that authenticates the whole vault file.
pub fn derive_hmac_key(master_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(master_key, b"lockguardium-hmac-key")
}

/// Run HKDF-SHA256 expand with the given `info`.
///
/// The extract step uses a zero salt: the master key already came out of
/// Argon2id and has full entropy.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// A wrapper around a 32-byte master key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the field encryption key for one record.
    pub fn derive_record_key(&self, record_id: u64) -> Result<[u8; KEY_LEN]> {
        derive_record_key(&self.bytes, record_id)
    }

    /// Derive the vault HMAC key.
    pub fn derive_hmac_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_hmac_key(&self.bytes)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}
