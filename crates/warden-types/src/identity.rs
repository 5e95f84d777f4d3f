//! Identity keys: the normalized form of a player's display name.
//!
//! Every lookup in Warden (allow-list, password hashes, live sessions)
//! goes through an [`IdentityKey`]. The same account may show up as
//! `"Alice"` one day and `"alice"` the next, and both must land on the
//! same record, so the key is the trimmed, lower-cased name.

use std::fmt;

/// Separates the display name from the password hash in a persisted
/// user entry (`"Alice:$argon2id$..."`). Names may never contain it.
pub const RECORD_DELIMITER: char = ':';

// ---------------------------------------------------------------------------
// IdentityKey
// ---------------------------------------------------------------------------

/// The case-folded, trimmed form of a display name.
///
/// This is a "newtype wrapper" around `String`. The only way to build one
/// is [`IdentityKey::from_name`], so holding an `IdentityKey` proves the
/// name was non-empty and free of whitespace and the record delimiter.
///
/// `Ord` is derived so keys can live in ordered collections and give
/// deterministic iteration in tests and log output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Normalizes a display name into its identity key.
    ///
    /// Returns `None` when the trimmed name is empty or not a valid
    /// identifier (see [`is_valid_name`]). Such names can never be
    /// allow-listed, which is how "empty names are never allowed" falls
    /// out of the type rather than being re-checked at every call site.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if !is_valid_name(trimmed) {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    /// The normalized key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `name` (already trimmed) can be used as a display
/// name: non-empty, no whitespace, no [`RECORD_DELIMITER`].
///
/// Host identifier charsets are narrower than this (letters, digits,
/// underscore), but these are the only characters that would break the
/// persisted format or the whitespace-delimited command syntax.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == RECORD_DELIMITER)
}
