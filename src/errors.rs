use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in LockGuardium.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Authentication failed — ciphertext was not produced under this key")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Unlock errors ---
    /// Deliberately generic: a wrong password and a tampered file look the same.
    #[error("Unable to unlock the vault — wrong password or damaged vault")]
    WrongPassword,

    #[error("Salt file is corrupt: {0}")]
    CorruptSalt(String),

    #[error("Vault file is corrupt: {0}")]
    CorruptVault(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Invalid record: {0}")]
    ValidationError(String),

    #[error("Record #{0} not found")]
    NotFound(u64),

    #[error("Could not save the vault: {0}")]
    PersistenceError(String),

    #[error("Vault is locked — unlock it first")]
    Locked,

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for LockGuardium results.
pub type Result<T> = std::result::Result<T, VaultError>;
