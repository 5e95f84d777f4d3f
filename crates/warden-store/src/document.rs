//! On-disk format of the store and the user-entry encoding.
//!
//! ```json
//! {
//!   "policy":   { "minPasswordLength": 5, "maxLoginAttempts": 5, "loginTimeoutSeconds": 300 },
//!   "commands": { "allowAddForEveryone": true, "allowRemoveForEveryone": false },
//!   "users":    [ "Alice:$argon2id$v=19$...", "Bob:" ]
//! }
//! ```
//!
//! Each user is a single string, `"<display name>:<hash>"`, with an empty
//! hash field when no password is set.

use serde::{Deserialize, Serialize};
use warden_types::{IdentityKey, RECORD_DELIMITER};

use crate::policy::{CommandAccess, RawPolicy};

/// One allow-listed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// The most recently seen casing of the player's name.
    pub display_name: String,
    /// Argon2 PHC string, if the player has registered.
    pub password_hash: Option<String>,
}

impl CredentialRecord {
    pub(crate) fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            password_hash: None,
        }
    }

    /// A blank hash is treated the same as no hash at all.
    pub fn has_password(&self) -> bool {
        self.password_hash
            .as_deref()
            .is_some_and(|hash| !hash.trim().is_empty())
    }
}

/// The whole store file.
///
/// Every field tolerates absence (`null` or missing) so a partially
/// written or older document still loads.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreDocument {
    #[serde(default)]
    pub policy: Option<RawPolicy>,
    #[serde(default)]
    pub commands: Option<CommandAccess>,
    #[serde(default)]
    pub users: Option<Vec<Option<String>>>,
}

/// Encodes a record as `"<name>:<hash>"` (or `"<name>:"`).
pub(crate) fn encode_entry(record: &CredentialRecord) -> String {
    let hash = if record.has_password() {
        record.password_hash.as_deref().unwrap_or_default()
    } else {
        ""
    };
    format!("{}{RECORD_DELIMITER}{hash}", record.display_name)
}

/// Decodes one user entry. Returns `None` for entries with no usable name.
///
/// Splits at the first delimiter only, so the hash may contain anything.
pub(crate) fn decode_entry(entry: &str) -> Option<(IdentityKey, CredentialRecord)> {
    if entry.trim().is_empty() {
        return None;
    }
    let (name, hash) = match entry.split_once(RECORD_DELIMITER) {
        Some((name, hash)) => (name.trim(), hash.trim()),
        None => (entry.trim(), ""),
    };
    let key = IdentityKey::from_name(name)?;
    let password_hash = (!hash.is_empty()).then(|| hash.to_string());
    Some((
        key,
        CredentialRecord {
            display_name: name.to_string(),
            password_hash,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_entry_with_hash() {
        let record = CredentialRecord {
            display_name: "Alice".into(),
            password_hash: Some("$argon2id$abc".into()),
        };
        assert_eq!(encode_entry(&record), "Alice:$argon2id$abc");
    }

    #[test]
    fn test_encode_entry_without_hash_keeps_trailing_delimiter() {
        assert_eq!(encode_entry(&CredentialRecord::new("Bob")), "Bob:");
    }

    #[test]
    fn test_encode_entry_blank_hash_written_as_empty() {
        let record = CredentialRecord {
            display_name: "Bob".into(),
            password_hash: Some("  ".into()),
        };
        assert_eq!(encode_entry(&record), "Bob:");
    }

    #[test]
    fn test_decode_entry_splits_at_first_delimiter() {
        let (key, record) = decode_entry("Carol:hash:with:colons").unwrap();
        assert_eq!(key.as_str(), "carol");
        assert_eq!(record.display_name, "Carol");
        assert_eq!(record.password_hash.as_deref(), Some("hash:with:colons"));
    }

    #[test]
    fn test_decode_entry_empty_hash_is_none() {
        let (_, record) = decode_entry("Bob:").unwrap();
        assert_eq!(record.password_hash, None);
    }

    #[test]
    fn test_decode_entry_without_delimiter_is_name_only() {
        let (key, record) = decode_entry("Dave").unwrap();
        assert_eq!(key.as_str(), "dave");
        assert!(!record.has_password());
    }

    #[test]
    fn test_decode_entry_missing_name_dropped() {
        assert!(decode_entry(":somehash").is_none());
        assert!(decode_entry("   ").is_none());
    }

    #[test]
    fn test_document_tolerates_missing_sections() {
        let doc: StoreDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.policy.is_none());
        assert!(doc.users.is_none());
    }

    #[test]
    fn test_document_tolerates_null_user_entries() {
        let doc: StoreDocument =
            serde_json::from_str(r#"{ "users": ["Alice:", null] }"#).unwrap();
        assert_eq!(doc.users.unwrap().len(), 2);
    }
}
