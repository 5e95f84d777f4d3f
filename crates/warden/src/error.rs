//! Error types for the Warden crate.
//!
//! Two layers:
//!
//! - [`WardenError`] wraps the sub-crate errors so callers of the
//!   composition root deal with one type.
//! - [`AuthError`] is the outcome taxonomy of a failed register/login.
//!   These are expected, player-caused results, not bugs; the `Display`
//!   text of each variant is what the player sees.

use warden_session::SessionError;
use warden_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Reading or writing the credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The password primitive failed or was misconfigured.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Coarse category of an [`AuthError`], used for logging and metrics
/// decisions by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The supplied password breaks the length policy.
    PolicyViolation,
    /// The request was refused (wrong password, wrong state, not listed).
    Rejected,
    /// Too many wrong passwords; the connection must be closed.
    LockedOut,
    /// Something on our side failed. The player is told to retry.
    Internal,
}

/// Why a register or login attempt did not authenticate the player.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("You are not authorized to register on this server.")]
    NotAllowed,

    #[error("You are already registered. Use /login <password>.")]
    AlreadyRegistered,

    #[error("Password must be at least {min} characters long.")]
    PasswordTooShort { min: u32 },

    #[error("Password must be at most {max} bytes long.")]
    PasswordTooLong { max: u32 },

    #[error("You must register first using /register <password>.")]
    NotRegistered,

    #[error("Incorrect password. Attempts remaining: {remaining}")]
    WrongPassword { remaining: u32 },

    #[error("Too many failed login attempts. Try again later.")]
    LockedOut,

    /// Hashing failed. The source is logged, never shown to the player.
    #[error("Something went wrong. Please try again.")]
    Internal(#[source] SessionError),
}

impl AuthError {
    /// The category this error falls into.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::PasswordTooShort { .. } | Self::PasswordTooLong { .. } => {
                AuthErrorKind::PolicyViolation
            }
            Self::NotAllowed
            | Self::AlreadyRegistered
            | Self::NotRegistered
            | Self::WrongPassword { .. } => AuthErrorKind::Rejected,
            Self::LockedOut => AuthErrorKind::LockedOut,
            Self::Internal(_) => AuthErrorKind::Internal,
        }
    }
}
