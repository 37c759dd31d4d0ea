//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - `CredentialRecord` and its encrypted on-disk row (`record`)
//! - Binary vault file format with HMAC integrity (`format`)
//! - File locations plus export/import of a whole installation (`paths`)
//! - High-level `VaultStore` for unlocking and editing a vault (`store`)

pub mod format;
pub mod paths;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use format::VaultHeader;
pub use paths::{export_vault, import_vault, VaultPaths, VaultStatus};
pub use record::{CredentialRecord, NewRecord, RecordSort, RecordUpdate, StoredRecord};
pub use store::VaultStore;
