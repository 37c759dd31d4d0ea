//! The unlocked vault.
//!
//! `VaultStore` wraps the binary format layer and the crypto layer so
//! that the rest of the application works with plain method calls like
//! `store.add_record(&NewRecord::new("GitHub", "", "octocat", "pw"))`.
//!
//! Holding a `VaultStore` *is* being unlocked: it owns the master key and
//! the decrypted records, and dropping it (or calling `lock`) wipes both.
//! Every mutation is written to disk before it returns; if the write
//! fails the in-memory change is undone, so memory and disk never
//! disagree.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::salt;
use crate::crypto::{decrypt_field, derive_key, encrypt_field, Argon2Params, MasterKey};
use crate::errors::{Result, VaultError};

use super::format::{self, VaultHeader};
use super::paths::VaultPaths;
use super::record::{CredentialRecord, NewRecord, RecordSort, RecordUpdate, StoredRecord};

/// An unlocked vault handle.
pub struct VaultStore {
    /// Where the vault and its salt live.
    paths: VaultPaths,

    /// Header metadata (version, id counter, KDF params).
    header: VaultHeader,

    /// Encrypted rows, exactly as persisted.  Same order as `records`.
    rows: Vec<StoredRecord>,

    /// Decrypted view of `rows`, in insertion order.
    records: Vec<CredentialRecord>,

    /// The derived master key (zeroized on drop).
    master_key: MasterKey,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Unlock / lock
    // ------------------------------------------------------------------

    /// Unlock the vault at `paths` with `password`.
    ///
    /// If no vault file exists yet this is the first-run path: the salt is
    /// loaded or created, a key is derived with `params` and an empty vault
    /// is written.  Otherwise the key is derived with the params stored in
    /// the vault header, the file MAC is checked and every encrypted field
    /// is decrypted.  A wrong password and a tampered file both surface as
    /// `WrongPassword`.
    pub fn unlock(paths: &VaultPaths, password: &[u8], params: &Argon2Params) -> Result<Self> {
        if paths.vault_exists() {
            Self::open_existing(paths, password)
        } else {
            Self::initialize(paths, password, params)
        }
    }

    fn initialize(paths: &VaultPaths, password: &[u8], params: &Argon2Params) -> Result<Self> {
        paths.ensure_data_dir()?;

        let salt = salt::load_or_create(paths.salt_file())?;
        let master_key = derive_key(password, &salt, params)?;

        let store = Self {
            paths: paths.clone(),
            header: VaultHeader::new(*params),
            rows: Vec::new(),
            records: Vec::new(),
            master_key,
        };
        store.persist()?;

        info!(path = %paths.vault_file().display(), "initialized empty vault");
        Ok(store)
    }

    fn open_existing(paths: &VaultPaths, password: &[u8]) -> Result<Self> {
        // 1. Read the binary vault file (raw bytes preserved).
        let raw = format::read_vault(paths.vault_file())?;

        // 2. A vault without its salt can never be opened again.
        let salt = salt::load(paths.salt_file())?;

        // 3. Derive the master key using the params stored at creation.
        //    The header is not authenticated yet, so out-of-range params
        //    are treated as damage rather than handed to Argon2.
        if let Err(e) = raw.header.argon2_params.validate() {
            debug!(error = %e, "vault header carries unusable Argon2 params");
            return Err(VaultError::CorruptVault(
                "vault header has out-of-range key derivation parameters".into(),
            ));
        }
        let master_key = derive_key(password, &salt, &raw.header.argon2_params)?;

        // 4. Verify the HMAC over the *original raw bytes* from disk.
        let hmac_key = Zeroizing::new(master_key.derive_hmac_key()?);
        match format::verify_hmac(
            hmac_key.as_slice(),
            &raw.header_bytes,
            &raw.records_bytes,
            &raw.stored_hmac,
        ) {
            Ok(()) => {}
            Err(VaultError::AuthenticationFailed) => {
                debug!("vault MAC did not verify");
                return Err(VaultError::WrongPassword);
            }
            Err(e) => return Err(e),
        }

        // 5. The file is authentic; make sure it is also coherent.
        check_row_ids(&raw.header, &raw.records)?;

        // 6. Decrypt every row.  All or nothing.
        let mut records = Vec::with_capacity(raw.records.len());
        for row in &raw.records {
            records.push(open_row(&master_key, row)?);
        }

        info!(records = records.len(), "vault unlocked");

        Ok(Self {
            paths: paths.clone(),
            header: raw.header,
            rows: raw.records,
            records,
            master_key,
        })
    }

    /// Discard the key and every decrypted record.
    pub fn lock(self) {
        debug!("vault locked");
        // Dropping zeroizes `master_key` and each `CredentialRecord`.
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Add a new record and persist it.
    ///
    /// The record gets the next unused id and `created_at == modified_at`.
    pub fn add_record(&mut self, input: &NewRecord) -> Result<CredentialRecord> {
        let input = input.normalized()?;

        let id = self.header.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| VaultError::CorruptVault("record id counter exhausted".into()))?;

        let now = Utc::now();
        let record = CredentialRecord {
            id,
            service: input.service.clone(),
            account_email: input.account_email.clone(),
            username: input.username.clone(),
            secret: input.secret.clone(),
            created_at: now,
            modified_at: now,
        };
        let row = seal_row(&self.master_key, &record)?;

        self.header.next_id = next_id;
        self.rows.push(row);
        self.records.push(record.clone());

        if let Err(e) = self.persist() {
            self.rows.pop();
            self.records.pop();
            self.header.next_id = id;
            warn!(record_id = id, "add rolled back: {e}");
            return Err(e);
        }

        debug!(record_id = id, "record added");
        Ok(record)
    }

    /// Merge `update` into record `id` and persist.
    ///
    /// Only fields whose value actually changes are re-encrypted; the
    /// other ciphertexts are kept byte-for-byte.
    pub fn update_record(&mut self, id: u64, update: &RecordUpdate) -> Result<CredentialRecord> {
        let update = update.normalized()?;
        let idx = self.index_of(id)?;

        let record_key = Zeroizing::new(self.master_key.derive_record_key(id)?);
        let mut record = self.records[idx].clone();
        let mut row = self.rows[idx].clone();

        if let Some(service) = &update.service {
            record.service.clone_from(service);
            row.service.clone_from(service);
        }
        if let Some(email) = &update.account_email {
            if *email != record.account_email {
                row.account_email = encrypt_field(record_key.as_slice(), email.as_bytes())?;
                record.account_email.zeroize();
                record.account_email.clone_from(email);
            }
        }
        if let Some(username) = &update.username {
            if *username != record.username {
                row.username = encrypt_field(record_key.as_slice(), username.as_bytes())?;
                record.username.zeroize();
                record.username.clone_from(username);
            }
        }
        if let Some(secret) = &update.secret {
            if *secret != record.secret {
                row.secret = encrypt_field(record_key.as_slice(), secret.as_bytes())?;
                record.secret.zeroize();
                record.secret.clone_from(secret);
            }
        }

        let modified_at = Utc::now().max(record.created_at);
        record.modified_at = modified_at;
        row.modified_at = modified_at;

        let old_row = std::mem::replace(&mut self.rows[idx], row);
        let old_record = std::mem::replace(&mut self.records[idx], record.clone());

        if let Err(e) = self.persist() {
            self.rows[idx] = old_row;
            self.records[idx] = old_record;
            warn!(record_id = id, "update rolled back: {e}");
            return Err(e);
        }

        debug!(record_id = id, "record updated");
        Ok(record)
    }

    /// Remove record `id` and persist.  Deleting twice fails with `NotFound`.
    pub fn delete_record(&mut self, id: u64) -> Result<()> {
        let idx = self.index_of(id)?;

        let row = self.rows.remove(idx);
        let record = self.records.remove(idx);

        if let Err(e) = self.persist() {
            self.rows.insert(idx, row);
            self.records.insert(idx, record);
            warn!(record_id = id, "delete rolled back: {e}");
            return Err(e);
        }

        debug!(record_id = id, "record deleted");
        Ok(())
    }

    /// All records in insertion order.
    pub fn list_records(&self) -> &[CredentialRecord] {
        &self.records
    }

    /// A sorted copy of all records.
    pub fn sorted_records(&self, sort: RecordSort) -> Vec<CredentialRecord> {
        let mut list = self.records.clone();
        match sort {
            RecordSort::Service => {
                list.sort_by_cached_key(|r| r.service.to_lowercase());
            }
            RecordSort::Created => list.sort_by_key(|r| (r.created_at, r.id)),
            RecordSort::Modified => {
                list.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then(a.id.cmp(&b.id)));
            }
        }
        list
    }

    /// Records whose service, email or username contains `query`
    /// (case-insensitive), in insertion order.  An empty query matches all.
    pub fn search_records(&self, query: &str) -> Vec<CredentialRecord> {
        let query = query.trim();
        self.records
            .iter()
            .filter(|r| query.is_empty() || r.matches(query))
            .cloned()
            .collect()
    }

    /// Look up one record by id.
    pub fn get_record(&self, id: u64) -> Result<&CredentialRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(VaultError::NotFound(id))
    }

    // ------------------------------------------------------------------
    // Master password change
    // ------------------------------------------------------------------

    /// Re-encrypt the whole vault under a key derived from `new_password`.
    ///
    /// The salt and KDF params stay the same.  The new file is written
    /// atomically before the in-memory key is swapped, so a failure leaves
    /// the vault usable with the old password.
    pub fn change_password(&mut self, new_password: &[u8]) -> Result<()> {
        let salt = salt::load(self.paths.salt_file())?;
        let new_key = derive_key(new_password, &salt, &self.header.argon2_params)?;

        let mut new_rows = Vec::with_capacity(self.records.len());
        for record in &self.records {
            new_rows.push(seal_row(&new_key, record)?);
        }

        let hmac_key = Zeroizing::new(new_key.derive_hmac_key()?);
        format::write_vault(
            self.paths.vault_file(),
            &self.header,
            &new_rows,
            hmac_key.as_slice(),
        )?;

        self.rows = new_rows;
        self.master_key = new_key;

        info!(records = self.records.len(), "master password changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serialize the vault and write it to disk atomically.
    pub fn persist(&self) -> Result<()> {
        let hmac_key = Zeroizing::new(self.master_key.derive_hmac_key()?);
        format::write_vault(
            self.paths.vault_file(),
            &self.header,
            &self.rows,
            hmac_key.as_slice(),
        )
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    pub fn header(&self) -> &VaultHeader {
        &self.header
    }

    /// Number of records in the vault.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the vault creation timestamp.
    pub fn created_at(&self) -> chrono::DateTime<Utc> {
        self.header.created_at
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(VaultError::NotFound(id))
    }
}

impl std::fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultStore")
            .field("paths", &self.paths)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Row sealing
// ---------------------------------------------------------------------------

/// Encrypt the private fields of `record` under its per-record key.
fn seal_row(master_key: &MasterKey, record: &CredentialRecord) -> Result<StoredRecord> {
    let record_key = Zeroizing::new(master_key.derive_record_key(record.id)?);
    let key = record_key.as_slice();

    Ok(StoredRecord {
        id: record.id,
        service: record.service.clone(),
        created_at: record.created_at,
        modified_at: record.modified_at,
        account_email: encrypt_field(key, record.account_email.as_bytes())?,
        username: encrypt_field(key, record.username.as_bytes())?,
        secret: encrypt_field(key, record.secret.as_bytes())?,
    })
}

/// Decrypt one row.  An authentication failure means the key is wrong
/// or the row was tampered with; both are reported as `WrongPassword`.
fn open_row(master_key: &MasterKey, row: &StoredRecord) -> Result<CredentialRecord> {
    let record_key = Zeroizing::new(master_key.derive_record_key(row.id)?);
    let key = record_key.as_slice();

    let field = |name: &str, ciphertext: &[u8]| -> Result<String> {
        let plaintext = decrypt_field(key, ciphertext).map_err(|e| match e {
            VaultError::AuthenticationFailed => {
                debug!(record_id = row.id, field = name, "field failed authentication");
                VaultError::WrongPassword
            }
            other => other,
        })?;
        String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::CorruptVault(format!("record {} {name} is not valid UTF-8", row.id))
        })
    };

    Ok(CredentialRecord {
        id: row.id,
        service: row.service.clone(),
        account_email: field("account_email", &row.account_email)?,
        username: field("username", &row.username)?,
        secret: field("secret", &row.secret)?,
        created_at: row.created_at,
        modified_at: row.modified_at,
    })
}

/// Ids must be unique and below the header's counter.
fn check_row_ids(header: &VaultHeader, rows: &[StoredRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.id) {
            return Err(VaultError::CorruptVault(format!("duplicate record id {}", row.id)));
        }
        if row.id >= header.next_id {
            return Err(VaultError::CorruptVault(format!(
                "record id {} is not below the id counter {}",
                row.id, header.next_id
            )));
        }
        if row.modified_at < row.created_at {
            return Err(VaultError::CorruptVault(format!(
                "record {} was modified before it was created",
                row.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unlocked(dir: &TempDir) -> VaultStore {
        let paths = VaultPaths::new(dir.path());
        VaultStore::unlock(&paths, b"unit-test-pw", &Argon2Params::minimum()).unwrap()
    }

    #[test]
    fn update_keeps_unchanged_ciphertexts() {
        let dir = TempDir::new().unwrap();
        let mut store = unlocked(&dir);
        let added = store
            .add_record(&NewRecord::new("Mail", "me@mail.test", "me", "old-pw"))
            .unwrap();
        let before = store.rows[0].clone();

        let mut update = RecordUpdate::default();
        update.secret = Some("new-pw".into());
        store.update_record(added.id, &update).unwrap();

        let after = &store.rows[0];
        assert_eq!(after.username, before.username);
        assert_eq!(after.account_email, before.account_email);
        assert_ne!(after.secret, before.secret);
    }

    #[test]
    fn rows_and_records_stay_aligned_after_delete() {
        let dir = TempDir::new().unwrap();
        let mut store = unlocked(&dir);
        for name in ["a", "b", "c"] {
            store.add_record(&NewRecord::new(name, "", "", "pw")).unwrap();
        }

        store.delete_record(2).unwrap();

        let row_ids: Vec<u64> = store.rows.iter().map(|r| r.id).collect();
        let record_ids: Vec<u64> = store.records.iter().map(|r| r.id).collect();
        assert_eq!(row_ids, vec![1, 3]);
        assert_eq!(row_ids, record_ids);
    }

    #[test]
    fn check_row_ids_rejects_duplicates_and_stale_counter() {
        let now = Utc::now();
        let row = |id| StoredRecord {
            id,
            service: "s".into(),
            created_at: now,
            modified_at: now,
            account_email: vec![],
            username: vec![],
            secret: vec![],
        };
        let mut header = VaultHeader::new(Argon2Params::minimum());
        header.next_id = 3;

        assert!(check_row_ids(&header, &[row(1), row(2)]).is_ok());
        assert!(check_row_ids(&header, &[row(1), row(1)]).is_err());
        assert!(check_row_ids(&header, &[row(3)]).is_err());
    }

    #[test]
    fn sealed_row_does_not_open_under_another_id() {
        let dir = TempDir::new().unwrap();
        let mut store = unlocked(&dir);
        store.add_record(&NewRecord::new("a", "", "", "pw-a")).unwrap();
        store.add_record(&NewRecord::new("b", "", "", "pw-b")).unwrap();

        let mut swapped = store.rows[1].clone();
        swapped.secret = store.rows[0].secret.clone();

        let result = open_row(&store.master_key, &swapped);
        assert!(matches!(result, Err(VaultError::WrongPassword)));
    }
}
