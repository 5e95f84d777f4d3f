//! The register and login flows.
//!
//! Both take the password by value as a [`Password`], so the plaintext is
//! wiped when the flow returns, whichever branch it returns from.
//!
//! ```text
//! register: listed? → no hash yet? → long enough? → short enough?
//!           → hash → store if still unset → save → authenticate
//!
//! login:    hash stored? → verify ─ ok ──→ authenticate
//!                                 └ bad ─→ count failure → locked out?
//! ```
//!
//! The flows never touch the host. They return an outcome and the caller
//! (the [`Warden`](crate::Warden)) switches play mode, sends messages, or
//! disconnects.

use tracing::{error, info, warn};
use warden_session::{Password, PasswordHasher, SessionTable};
use warden_store::{CredentialStore, PolicyConfig};
use warden_types::IdentityKey;

use crate::AuthError;

/// How a player became authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authenticated {
    Registered,
    LoggedIn,
}

/// Register/login logic over borrowed components.
///
/// Cheap to construct; the composition root builds one per command.
pub struct AuthenticationFlow<'a> {
    store: &'a CredentialStore,
    sessions: &'a SessionTable,
    hasher: &'a dyn PasswordHasher,
}

impl<'a> AuthenticationFlow<'a> {
    pub fn new(
        store: &'a CredentialStore,
        sessions: &'a SessionTable,
        hasher: &'a dyn PasswordHasher,
    ) -> Self {
        Self {
            store,
            sessions,
            hasher,
        }
    }

    /// Sets the first password for an allow-listed player and logs them in.
    pub fn register(&self, name: &str, password: Password) -> Result<Authenticated, AuthError> {
        if !self.store.is_allowed(name) {
            warn!(player = %name, "registration refused: not allow-listed");
            return Err(AuthError::NotAllowed);
        }
        if self.store.has_password_hash(name) {
            return Err(AuthError::AlreadyRegistered);
        }

        let min = self.store.min_password_length();
        if password.char_len() < min as usize {
            warn!(player = %name, min, "registration refused: password too short");
            return Err(AuthError::PasswordTooShort { min });
        }
        let max = PolicyConfig::PASSWORD_INPUT_LIMIT;
        if password.byte_len() > max as usize {
            warn!(player = %name, max, "registration refused: password too long");
            return Err(AuthError::PasswordTooLong { max });
        }

        let hash = self.hasher.hash(&password).map_err(|e| {
            error!(player = %name, error = %e, "password hashing failed");
            AuthError::Internal(e)
        })?;
        drop(password);

        if !self.store.set_password_hash_if_absent(name, &hash) {
            // Lost a race with another register, or the player was removed
            // from the allow-list while hashing.
            if !self.store.is_allowed(name) {
                warn!(player = %name, "registration refused: removed while hashing");
                return Err(AuthError::NotAllowed);
            }
            warn!(player = %name, "registration refused: password set concurrently");
            return Err(AuthError::AlreadyRegistered);
        }
        if let Err(e) = self.store.save() {
            // The hash is live in memory; the next successful save persists it.
            error!(player = %name, error = %e, "failed to persist new registration");
        }

        self.authenticate(name);
        info!(player = %name, "registered");
        Ok(Authenticated::Registered)
    }

    /// Checks a registered player's password.
    ///
    /// A wrong password counts toward the lockout limit. Reaching the
    /// limit ends the session and returns [`AuthError::LockedOut`]; the
    /// caller must then disconnect the player.
    pub fn login(&self, name: &str, password: Password) -> Result<Authenticated, AuthError> {
        let Some(stored) = self.store.password_hash(name) else {
            return Err(AuthError::NotRegistered);
        };

        let verified = match self.hasher.verify(&password, &stored) {
            Ok(verified) => verified,
            Err(e) => {
                error!(player = %name, error = %e, "password verification failed, counting as wrong");
                false
            }
        };
        drop(password);

        if verified {
            self.authenticate(name);
            info!(player = %name, "logged in");
            return Ok(Authenticated::LoggedIn);
        }

        let max = self.store.max_login_attempts();
        let attempts = match IdentityKey::from_name(name) {
            Some(key) => self.sessions.record_failure(&key),
            None => 0,
        };
        warn!(player = %name, attempts, max, "failed login");

        if attempts >= max {
            if let Some(key) = IdentityKey::from_name(name) {
                self.sessions.end(&key);
            }
            warn!(player = %name, attempts, "locked out");
            return Err(AuthError::LockedOut);
        }
        Err(AuthError::WrongPassword {
            remaining: max - attempts,
        })
    }

    fn authenticate(&self, name: &str) {
        let Some(key) = IdentityKey::from_name(name) else {
            return;
        };
        self.sessions.refresh_display_name(&key, name);
        if !self.sessions.mark_authenticated(&key) {
            warn!(player = %name, "authenticated without an active session");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
