//! Session type: the server's record of one connected player's
//! authentication progress.
//!
//! A session tracks:
//! - WHO the player is (identity key + latest display name)
//! - WHERE they stood when they joined (the anchor they're frozen to)
//! - WHETHER they've authenticated yet
//! - HOW MANY wrong passwords they've tried
//! - WHEN they were last nagged to log in

use std::time::{Duration, Instant};

use warden_types::{IdentityKey, Orientation, Position};

/// Authentication state for one connected identity.
///
/// ```text
///   join ──→ [pending] ──(register / login)──→ [authenticated]
///               │  │
///               │  └──(wrong password × max)──→ removed (locked out)
///               └──(timeout / audit / disconnect)──→ removed
/// ```
///
/// Authentication never removes the session; it only flips the flag.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity_key: IdentityKey,
    pub display_name: String,
    pub joined_at: Instant,
    /// Fixed at join time, never updated.
    pub anchor_position: Position,
    /// Fixed at join time, never updated.
    pub anchor_orientation: Orientation,
    pub authenticated: bool,
    /// Reset to 0 whenever `authenticated` becomes true.
    pub failed_attempts: u32,
    /// `None` until the first reminder is sent.
    pub last_reminder_at: Option<Instant>,
}

impl Session {
    pub fn new(
        identity_key: IdentityKey,
        display_name: &str,
        anchor_position: Position,
        anchor_orientation: Orientation,
        joined_at: Instant,
    ) -> Self {
        Self {
            identity_key,
            display_name: display_name.to_string(),
            joined_at,
            anchor_position,
            anchor_orientation,
            authenticated: false,
            failed_attempts: 0,
            last_reminder_at: None,
        }
    }

    /// Returns `true` if this session is still unauthenticated after
    /// `timeout` has elapsed since join. Authenticated sessions never
    /// time out.
    pub fn has_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        !self.authenticated && now.saturating_duration_since(self.joined_at) >= timeout
    }

    /// Returns `true` if at least `interval` has passed since the last
    /// reminder (or none was ever sent).
    pub fn reminder_due(&self, now: Instant, interval: Duration) -> bool {
        match self.last_reminder_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= interval,
        }
    }
}
