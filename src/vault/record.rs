//! Credential records: the decrypted view handed to callers and the
//! encrypted row that is written to disk.
//!
//! `StoredRecord` keeps `id`, `service` and timestamps in plaintext so a
//! vault can be indexed without the key; `account_email`, `username` and
//! `secret` are AES-256-GCM ciphertexts serialized as base64 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::format::{base64_decode, base64_encode};
use crate::errors::{Result, VaultError};

/// A decrypted credential.  Only exists while the vault is unlocked.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    #[zeroize(skip)]
    pub id: u64,
    pub service: String,
    pub account_email: String,
    pub username: String,
    /// The password itself.
    pub secret: String,
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub modified_at: DateTime<Utc>,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("account_email", &self.account_email)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("modified_at", &self.modified_at)
            .finish()
    }
}

impl CredentialRecord {
    /// Case-insensitive substring match on service, email and username.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.service.to_lowercase().contains(&query)
            || self.account_email.to_lowercase().contains(&query)
            || self.username.to_lowercase().contains(&query)
    }
}

/// One encrypted row of the vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    pub service: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub account_email: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub username: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub secret: Vec<u8>,
}

/// Input for `add_record`.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct NewRecord {
    pub service: String,
    pub account_email: String,
    pub username: String,
    pub secret: String,
}

impl NewRecord {
    pub fn new(service: &str, account_email: &str, username: &str, secret: &str) -> Self {
        Self {
            service: service.to_string(),
            account_email: account_email.to_string(),
            username: username.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Trim the display fields and enforce the mandatory ones.
    pub(crate) fn normalized(&self) -> Result<Self> {
        let service = normalize_service(&self.service)?;
        validate_secret(&self.secret)?;
        Ok(Self {
            service,
            account_email: self.account_email.trim().to_string(),
            username: self.username.trim().to_string(),
            secret: self.secret.clone(),
        })
    }
}

impl std::fmt::Debug for NewRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewRecord")
            .field("service", &self.service)
            .field("account_email", &self.account_email)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Partial update for `update_record`.  `None` leaves a field unchanged.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct RecordUpdate {
    pub service: Option<String>,
    pub account_email: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
}

impl RecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.account_email.is_none()
            && self.username.is_none()
            && self.secret.is_none()
    }

    pub(crate) fn normalized(&self) -> Result<Self> {
        let service = self.service.as_deref().map(normalize_service).transpose()?;
        if let Some(secret) = &self.secret {
            validate_secret(secret)?;
        }
        Ok(Self {
            service,
            account_email: self.account_email.as_deref().map(|s| s.trim().to_string()),
            username: self.username.as_deref().map(|s| s.trim().to_string()),
            secret: self.secret.clone(),
        })
    }
}

impl std::fmt::Debug for RecordUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordUpdate")
            .field("service", &self.service)
            .field("account_email", &self.account_email)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Orderings offered by `VaultStore::sorted_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSort {
    /// Alphabetical by service, ignoring case.
    Service,
    /// Oldest first.
    Created,
    /// Most recently modified first.
    Modified,
}

impl std::str::FromStr for RecordSort {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "service" | "name" => Ok(Self::Service),
            "created" => Ok(Self::Created),
            "modified" | "updated" => Ok(Self::Modified),
            other => Err(VaultError::CommandFailed(format!(
                "unknown sort '{other}' (expected service, created or modified)"
            ))),
        }
    }
}

fn normalize_service(service: &str) -> Result<String> {
    let trimmed = service.trim();
    if trimmed.is_empty() {
        return Err(VaultError::ValidationError("service is required".into()));
    }
    Ok(trimmed.to_string())
}

fn validate_secret(secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(VaultError::ValidationError("password is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CredentialRecord {
        let now = Utc::now();
        CredentialRecord {
            id: 1,
            service: "GitHub".into(),
            account_email: "dev@example.com".into(),
            username: "octocat".into(),
            secret: "s3cr3t!".into(),
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("s3cr3t!"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("GitHub"));
    }

    #[test]
    fn matches_is_case_insensitive_across_fields() {
        let record = sample();
        assert!(record.matches("github"));
        assert!(record.matches("EXAMPLE.COM"));
        assert!(record.matches("octo"));
        assert!(!record.matches("s3cr3t"), "the secret is never searched");
    }

    #[test]
    fn new_record_trims_display_fields_but_not_secret() {
        let input = NewRecord::new("  Mail ", " a@b.c ", " me ", "  pw  ");
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.service, "Mail");
        assert_eq!(normalized.account_email, "a@b.c");
        assert_eq!(normalized.username, "me");
        assert_eq!(normalized.secret, "  pw  ");
    }

    #[test]
    fn new_record_requires_service_and_secret() {
        let no_service = NewRecord::new("   ", "", "", "pw");
        assert!(matches!(
            no_service.normalized(),
            Err(VaultError::ValidationError(_))
        ));

        let no_secret = NewRecord::new("Mail", "", "", "");
        assert!(matches!(
            no_secret.normalized(),
            Err(VaultError::ValidationError(_))
        ));
    }

    #[test]
    fn update_rejects_blanking_mandatory_fields() {
        let mut blank_secret = RecordUpdate::default();
        blank_secret.secret = Some(String::new());
        assert!(blank_secret.normalized().is_err());

        let mut blank_service = RecordUpdate::default();
        blank_service.service = Some(" ".into());
        assert!(blank_service.normalized().is_err());

        // Optional fields may be cleared.
        let mut clear_email = RecordUpdate::default();
        clear_email.account_email = Some(String::new());
        assert!(clear_email.normalized().is_ok());
    }

    #[test]
    fn parse_sort_names() {
        assert_eq!("service".parse::<RecordSort>().unwrap(), RecordSort::Service);
        assert_eq!("Created".parse::<RecordSort>().unwrap(), RecordSort::Created);
        assert_eq!("updated".parse::<RecordSort>().unwrap(), RecordSort::Modified);
        assert!("size".parse::<RecordSort>().is_err());
    }
}
