//! Command gate: what an unauthenticated player may type.
//!
//! Until a player has logged in or registered, every command except
//! `login` and `register` is blocked. Blocking is silent except for a
//! rate-limited reminder, so a client spamming commands gets one nudge
//! every few seconds rather than a wall of text.

use std::time::{Duration, Instant};

use warden_session::SessionTable;
use warden_types::IdentityKey;

use crate::command::command_word;

/// Command words an unauthenticated player may always use.
pub const AUTH_COMMANDS: [&str; 2] = ["login", "register"];

/// The gate's decision for one command attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Let the host run the command.
    Allow,
    /// Swallow the command. `remind` says whether the caller should send
    /// the login reminder now.
    Block { remind: bool },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

/// Decides whether `raw` may run for the player with identity `key`.
///
/// Players without a session are not Warden's business (console,
/// bots, someone mid-disconnect) and always pass. When a command is
/// blocked and the reminder is due, the reminder stamp is updated here;
/// the caller only has to deliver the message.
pub fn check(
    sessions: &SessionTable,
    key: &IdentityKey,
    raw: &str,
    now: Instant,
    reminder_interval: Duration,
) -> Verdict {
    let Some(session) = sessions.get(key) else {
        return Verdict::Allow;
    };
    if session.authenticated {
        return Verdict::Allow;
    }

    let word = command_word(raw);
    if word.is_empty() || AUTH_COMMANDS.contains(&word.as_str()) {
        return Verdict::Allow;
    }

    let remind = sessions.claim_reminder(key, now, reminder_interval);
    tracing::trace!(%key, command = %word, remind, "blocked command before authentication");
    Verdict::Block { remind }
}
