//! AES-256-GCM field encryption.
//!
//! Each call to `encrypt_field` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt_field` splits the nonce back
//! out before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt_field(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt_field`.
///
/// Any failure (short input, wrong key, flipped bit) is reported as
/// `AuthenticationFailed`; garbage plaintext is never returned.
pub fn decrypt_field(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::AuthenticationFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ciphertext_length_is_plaintext_plus_overhead() {
        let key = [0x01u8; 32];
        let ct = encrypt_field(&key, b"hunter2").unwrap();
        assert_eq!(ct.len(), NONCE_LEN + 7 + TAG_LEN);
    }

    #[test]
    fn empty_plaintext_still_carries_a_tag() {
        let key = [0x02u8; 32];
        let ct = encrypt_field(&key, b"").unwrap();
        assert_eq!(ct.len(), NONCE_LEN + TAG_LEN);
        assert!(decrypt_field(&key, &ct).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_key_length() {
        assert!(encrypt_field(&[0u8; 16], b"x").is_err());
    }

    #[test]
    fn nonce_only_input_is_rejected() {
        let key = [0x03u8; 32];
        let result = decrypt_field(&key, &[0u8; NONCE_LEN]);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }
}
