//! Binary vault file format and HMAC integrity verification.
//!
//! A `.lgv` file has this layout:
//!
//! ```text
//! [LGVT: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][records JSON][HMAC-SHA256: 32 bytes]
//! ```
//!
//! - **Magic** (`LGVT`): identifies the file as a LockGuardium vault.
//! - **Version**: format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the records JSON begins.
//! - **Header JSON**: serialized `VaultHeader`.
//! - **Records JSON**: serialized `Vec<StoredRecord>`.
//! - **HMAC-SHA256**: 32-byte tag computed over header + records bytes.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::record::StoredRecord;
use crate::atomic::write_atomic;
use crate::crypto::Argon2Params;
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"LGVT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Size of the HMAC tag appended to the file (SHA-256 = 32 bytes).
const HMAC_LEN: usize = 32;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHeader {
    /// Format version.
    pub version: u8,

    /// When this vault was first created.
    pub created_at: DateTime<Utc>,

    /// Id the next added record will receive.  Only ever grows, so a
    /// deleted record's id is never handed out again.
    pub next_id: u64,

    /// Argon2 params used at vault creation (unlock derives with these).
    pub argon2_params: Argon2Params,
}

impl VaultHeader {
    pub fn new(argon2_params: Argon2Params) -> Self {
        Self {
            version: CURRENT_VERSION,
            created_at: Utc::now(),
            next_id: 1,
            argon2_params,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize a vault into its on-disk byte representation.
pub fn encode_vault(header: &VaultHeader, records: &[StoredRecord], hmac_key: &[u8]) -> Result<Vec<u8>> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| VaultError::SerializationError(format!("header: {e}")))?;
    let records_bytes = serde_json::to_vec(records)
        .map_err(|e| VaultError::SerializationError(format!("records: {e}")))?;

    let hmac_tag = compute_hmac(hmac_key, &header_bytes, &records_bytes)?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        VaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;
    let total = PREFIX_LEN + header_bytes.len() + records_bytes.len() + HMAC_LEN;
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&header_bytes); // header JSON
    buf.extend_from_slice(&records_bytes); // records JSON
    buf.extend_from_slice(&hmac_tag); // 32 bytes

    Ok(buf)
}

/// Write a vault file to disk **atomically**.
///
/// The bytes go to a temp file in the same directory which is then
/// renamed over `path`, so a crash leaves either the old vault or the
/// new one.  I/O failures are reported as `PersistenceError`.
pub fn write_vault(
    path: &Path,
    header: &VaultHeader,
    records: &[StoredRecord],
    hmac_key: &[u8],
) -> Result<()> {
    let buf = encode_vault(header, records, hmac_key)?;

    write_atomic(path, &buf).map_err(|e| {
        VaultError::PersistenceError(format!("writing {}: {e}", path.display()))
    })
}

/// Raw data read from a vault file on disk.
///
/// Keeps the original bytes so the HMAC can be verified over the
/// exact bytes that were written — no re-serialization needed.
pub struct RawVault {
    pub header: VaultHeader,
    pub records: Vec<StoredRecord>,
    /// The raw header JSON bytes exactly as stored on disk.
    pub header_bytes: Vec<u8>,
    /// The raw records JSON bytes exactly as stored on disk.
    pub records_bytes: Vec<u8>,
    /// The HMAC tag stored at the end of the file.
    pub stored_hmac: Vec<u8>,
}

/// Read a vault file from disk and return its parts **with raw bytes**.
///
/// The caller must verify the HMAC over `header_bytes` and
/// `records_bytes` before trusting the deserialized data.
pub fn read_vault(path: &Path) -> Result<RawVault> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::VaultNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(VaultError::CorruptVault(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    parse_vault(&data)
}

/// Parse vault bytes without touching the filesystem.
pub fn parse_vault(data: &[u8]) -> Result<RawVault> {
    // Minimum size: prefix + HMAC.
    let min_size = PREFIX_LEN + HMAC_LEN;
    if data.len() < min_size {
        return Err(VaultError::CorruptVault(
            "file too small to be a valid vault".into(),
        ));
    }

    // --- Parse the fixed-size prefix ---

    if &data[0..4] != MAGIC {
        return Err(VaultError::CorruptVault("missing LGVT magic bytes".into()));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(VaultError::CorruptVault(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| VaultError::CorruptVault("bad header length".into()))?,
    );
    let header_len = usize::try_from(header_len_u32).map_err(|_| {
        VaultError::CorruptVault(format!(
            "header length {header_len_u32} exceeds platform address space"
        ))
    })?;

    let header_end = PREFIX_LEN
        .checked_add(header_len)
        .ok_or_else(|| VaultError::CorruptVault("header length overflows".into()))?;
    if header_end + HMAC_LEN > data.len() {
        return Err(VaultError::CorruptVault(
            "header length exceeds file size".into(),
        ));
    }

    // --- Extract the three variable-length sections as raw bytes ---

    let header_bytes = data[PREFIX_LEN..header_end].to_vec();
    let records_end = data.len() - HMAC_LEN;
    let records_bytes = data[header_end..records_end].to_vec();
    let stored_hmac = data[records_end..].to_vec();

    // --- Deserialize from the raw bytes ---

    let header: VaultHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| VaultError::CorruptVault(format!("header JSON: {e}")))?;

    let records: Vec<StoredRecord> = serde_json::from_slice(&records_bytes)
        .map_err(|e| VaultError::CorruptVault(format!("records JSON: {e}")))?;

    Ok(RawVault {
        header,
        records,
        header_bytes,
        records_bytes,
        stored_hmac,
    })
}

/// Compute HMAC-SHA256 over header + records bytes.
pub fn compute_hmac(hmac_key: &[u8], header_bytes: &[u8], records_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;

    mac.update(header_bytes);
    mac.update(records_bytes);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify that the HMAC matches using constant-time comparison.
///
/// A mismatch is reported as `AuthenticationFailed`; the store turns it
/// into the user-facing `WrongPassword`.
pub fn verify_hmac(
    hmac_key: &[u8],
    header_bytes: &[u8],
    records_bytes: &[u8],
    expected_hmac: &[u8],
) -> Result<()> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;

    mac.update(header_bytes);
    mac.update(records_bytes);

    mac.verify_slice(expected_hmac)
        .map_err(|_| VaultError::AuthenticationFailed)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x5A; 32];

    fn row(id: u64) -> StoredRecord {
        let now = Utc::now();
        StoredRecord {
            id,
            service: format!("service-{id}"),
            created_at: now,
            modified_at: now,
            account_email: vec![1, 2, 3],
            username: vec![4, 5],
            secret: vec![6],
        }
    }

    #[test]
    fn encode_then_parse_preserves_header_and_rows() {
        let header = VaultHeader::new(Argon2Params::minimum());
        let rows = vec![row(1), row(2)];

        let bytes = encode_vault(&header, &rows, &KEY).unwrap();
        let raw = parse_vault(&bytes).unwrap();

        assert_eq!(raw.header, header);
        assert_eq!(raw.records.len(), 2);
        assert_eq!(raw.records[1].service, "service-2");
        assert_eq!(raw.records[0].username, vec![4, 5]);
        verify_hmac(&KEY, &raw.header_bytes, &raw.records_bytes, &raw.stored_hmac).unwrap();
    }

    #[test]
    fn hmac_rejects_other_key() {
        let header = VaultHeader::new(Argon2Params::minimum());
        let bytes = encode_vault(&header, &[row(1)], &KEY).unwrap();
        let raw = parse_vault(&bytes).unwrap();

        let result = verify_hmac(&[0u8; 32], &raw.header_bytes, &raw.records_bytes, &raw.stored_hmac);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn rejects_bad_magic() {
        let header = VaultHeader::new(Argon2Params::minimum());
        let mut bytes = encode_vault(&header, &[], &KEY).unwrap();
        bytes[0] = b'X';
        assert!(matches!(parse_vault(&bytes), Err(VaultError::CorruptVault(_))));
    }

    #[test]
    fn rejects_unknown_version() {
        let header = VaultHeader::new(Argon2Params::minimum());
        let mut bytes = encode_vault(&header, &[], &KEY).unwrap();
        bytes[4] = 9;
        assert!(matches!(parse_vault(&bytes), Err(VaultError::CorruptVault(_))));
    }

    #[test]
    fn rejects_truncated_file() {
        assert!(matches!(parse_vault(b"LGVT"), Err(VaultError::CorruptVault(_))));
    }

    #[test]
    fn rejects_oversized_header_length() {
        let header = VaultHeader::new(Argon2Params::minimum());
        let mut bytes = encode_vault(&header, &[], &KEY).unwrap();
        bytes[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(parse_vault(&bytes), Err(VaultError::CorruptVault(_))));
    }

    #[test]
    fn ciphertext_columns_are_base64_in_json() {
        let json = serde_json::to_string(&row(3)).unwrap();
        assert!(json.contains("\"username\":\"BAU=\""), "got {json}");
    }
}
