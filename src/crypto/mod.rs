//! Cryptographic primitives for LockGuardium.
//!
//! This module provides:
//! - The per-vault salt file (`salt`)
//! - Argon2id password-based key derivation (`kdf`)
//! - HKDF-based per-record key and HMAC key derivation (`keys`)
//! - AES-256-GCM field encryption and decryption (`encryption`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod salt;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt_field, derive_key, Salt, ...};
pub use encryption::{decrypt_field, encrypt_field};
pub use kdf::{derive_key, Argon2Params};
pub use keys::{derive_hmac_key, derive_record_key, MasterKey};
pub use salt::Salt;
