//! Error types for the session layer.

/// Errors from the password primitive.
///
/// The session table itself never fails: operations on a missing session
/// are logged no-ops. Only hashing can go wrong, and callers treat every
/// variant here as "authentication failed", never as a crash.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Computing or checking a hash failed inside the primitive.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The stored hash string could not be parsed. Usually a hand-edited
    /// or truncated store entry.
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    /// The hashing cost parameters were rejected.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),
}
