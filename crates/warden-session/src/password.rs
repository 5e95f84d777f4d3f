//! The password primitive: plaintext handling, hashing, and verification.
//!
//! Two pieces live here:
//!
//! - [`Password`] — the only type plaintext passwords travel in. It wraps
//!   a `Zeroizing<String>`, so the bytes are overwritten with zeros when
//!   the value drops, on every exit path: success, rejection, early
//!   return, or unwinding panic.
//! - [`PasswordHasher`] — a trait for the slow, salted, one-way hash.
//!   [`Argon2Hasher`] is the production implementation; tests plug in the
//!   same type with a tiny cost so they don't spend seconds per hash.

use std::fmt;

use argon2::password_hash::{Error as HashError, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use rand::Rng;
use zeroize::Zeroizing;

use crate::SessionError;

// ---------------------------------------------------------------------------
// Password
// ---------------------------------------------------------------------------

/// A plaintext password, wiped from memory on drop.
///
/// Deliberately has no `Clone` and a redacted `Debug`, so it can't be
/// duplicated or logged by accident.
pub struct Password(Zeroizing<String>);

impl Password {
    /// Takes ownership of `plaintext`. The allocation passed in is the one
    /// that gets wiped, so no unzeroed copy is left behind.
    pub fn new(plaintext: String) -> Self {
        Self(Zeroizing::new(plaintext))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length in characters, which is what password policies count.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Length in bytes, which is what hash input limits count.
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

impl From<String> for Password {
    fn from(plaintext: String) -> Self {
        Self::new(plaintext)
    }
}

// ---------------------------------------------------------------------------
// PasswordHasher
// ---------------------------------------------------------------------------

/// Produces and checks password hashes.
///
/// # Trait bounds
///
/// - `Send + Sync` → one hasher is shared by every command handler.
/// - `'static` → it lives as long as the server.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hashes `password` with a fresh random salt. The returned string
    /// is self-describing (algorithm, cost, salt, digest).
    fn hash(&self, password: &Password) -> Result<String, SessionError>;

    /// Checks `password` against a string previously returned by
    /// [`hash`](Self::hash).
    ///
    /// `Ok(false)` means "wrong password". `Err` means the check couldn't
    /// be performed at all (malformed stored hash, primitive failure).
    fn verify(&self, password: &Password, stored: &str) -> Result<bool, SessionError>;
}

/// Argon2id with a fixed cost.
///
/// The cost is baked into each hash, so verification always uses the
/// parameters the hash was created with. Changing the cost only affects
/// newly registered passwords.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Creates a hasher with the production cost (argon2's recommended
    /// default: 19 MiB memory, 2 passes, 1 lane).
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Creates a hasher with a custom cost. Mostly for tests, which use
    /// the smallest legal cost to stay fast.
    pub fn with_cost(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Result<Self, SessionError> {
        let params = Params::new(m_cost_kib, t_cost, p_cost, None)
            .map_err(|e| SessionError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &Password) -> Result<String, SessionError> {
        let salt_bytes: [u8; 16] = rand::rng().random();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| SessionError::Hash(e.to_string()))?;

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SessionError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &Password, stored: &str) -> Result<bool, SessionError> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| SessionError::MalformedHash(e.to_string()))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(SessionError::Hash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::with_cost(8, 1, 1).expect("minimum argon2 cost is valid")
    }

    fn pw(s: &str) -> Password {
        Password::new(s.to_string())
    }

    #[test]
    fn test_hash_then_verify_correct_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash(&pw("secret1")).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&pw("secret1"), &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password_is_false_not_error() {
        let hasher = fast_hasher();
        let hash = hasher.hash(&pw("secret1")).unwrap();

        assert!(!hasher.verify(&pw("secret2"), &hash).unwrap());
    }

    #[test]
    fn test_hash_same_password_different_salts() {
        let hasher = fast_hasher();
        let a = hasher.hash(&pw("secret1")).unwrap();
        let b = hasher.hash(&pw("secret1")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_malformed_hash_returns_error() {
        let hasher = fast_hasher();
        let result = hasher.verify(&pw("secret1"), "not-a-phc-string");
        assert!(matches!(result, Err(SessionError::MalformedHash(_))));
    }

    #[test]
    fn test_verify_uses_cost_from_hash_not_hasher() {
        let cheap = fast_hasher();
        let hash = cheap.hash(&pw("secret1")).unwrap();

        let other = Argon2Hasher::with_cost(16, 2, 1).unwrap();
        assert!(other.verify(&pw("secret1"), &hash).unwrap());
    }

    #[test]
    fn test_with_cost_rejects_invalid_params() {
        let result = Argon2Hasher::with_cost(1, 0, 0);
        assert!(matches!(result, Err(SessionError::InvalidParams(_))));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let rendered = format!("{:?}", pw("hunter22"));
        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn test_password_lengths_chars_vs_bytes() {
        let p = pw("pässwörd");
        assert_eq!(p.char_len(), 8);
        assert_eq!(p.byte_len(), 10);
    }
}
