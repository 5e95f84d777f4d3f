//! The session table: every live session, keyed by identity.
//!
//! Responsible for:
//! - Creating a session when an allow-listed player joins
//! - Flipping it to authenticated after register/login
//! - Counting wrong passwords
//! - Rate-limiting "please log in" reminders
//! - Dropping it on disconnect, kick, timeout, or lockout
//!
//! # Concurrency note
//!
//! Join/disconnect callbacks, command execution, and the heartbeat sweep
//! all touch this table, possibly at the same time. It's backed by a
//! `DashMap`, which shards the map and locks per shard, so every method
//! here is an atomic read-modify-write on its key with no locking on the
//! caller's side.
//!
//! Lookups hand out clones, never references into the map. Holding a
//! `DashMap` guard while calling back into the host (which may call back
//! into us) is how you deadlock a shard.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use warden_types::{IdentityKey, Orientation, Position};

use crate::Session;

/// Concurrent map from identity key to [`Session`].
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: DashMap<IdentityKey, Session>,
}

impl SessionTable {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Starts a fresh, unauthenticated session for `key`.
    ///
    /// Replaces any stale session left under the same key, e.g. when the
    /// host never delivered the disconnect event.
    pub fn start(
        &self,
        key: IdentityKey,
        display_name: &str,
        position: Position,
        orientation: Orientation,
        joined_at: Instant,
    ) -> Session {
        let session = Session::new(key.clone(), display_name, position, orientation, joined_at);
        if self.sessions.insert(key, session.clone()).is_some() {
            tracing::debug!(player = %display_name, "replaced stale session");
        }
        tracing::debug!(player = %display_name, "session started");
        session
    }

    /// Removes the session for `key`. Safe to call any number of times.
    ///
    /// Returns whether a session was removed.
    pub fn end(&self, key: &IdentityKey) -> bool {
        let removed = self.sessions.remove(key).is_some();
        if removed {
            tracing::debug!(%key, "session ended");
        }
        removed
    }

    /// A snapshot of the session for `key`, if one exists.
    pub fn get(&self, key: &IdentityKey) -> Option<Session> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    /// Returns `true` if `key` has a session and it is authenticated.
    pub fn is_authenticated(&self, key: &IdentityKey) -> bool {
        self.sessions.get(key).is_some_and(|s| s.authenticated)
    }

    /// Marks the session authenticated, clearing the failure counter and
    /// the reminder stamp.
    ///
    /// Returns `false` (and does nothing) if there is no session.
    pub fn mark_authenticated(&self, key: &IdentityKey) -> bool {
        match self.sessions.get_mut(key) {
            Some(mut session) => {
                session.authenticated = true;
                session.failed_attempts = 0;
                session.last_reminder_at = None;
                true
            }
            None => false,
        }
    }

    /// Increments the wrong-password counter and returns the new count.
    ///
    /// Returns 0 if there's no session. That means a caller ran the login
    /// flow for someone who isn't connected, which is a bug in the
    /// caller's ordering, not something the player did.
    pub fn record_failure(&self, key: &IdentityKey) -> u32 {
        match self.sessions.get_mut(key) {
            Some(mut session) => {
                session.failed_attempts += 1;
                session.failed_attempts
            }
            None => {
                tracing::warn!(%key, "login failure recorded without an active session");
                0
            }
        }
    }

    /// Updates the display name tracked by the session.
    pub fn refresh_display_name(&self, key: &IdentityKey, name: &str) -> bool {
        match self.sessions.get_mut(key) {
            Some(mut session) => {
                session.display_name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Claims the right to send a login reminder.
    ///
    /// Returns `true` and stamps `last_reminder_at = now` if the session
    /// exists, is unauthenticated, and no reminder went out within
    /// `interval`. The check and the stamp happen under one shard lock,
    /// so two blocked commands racing each other produce one reminder.
    pub fn claim_reminder(&self, key: &IdentityKey, now: Instant, interval: Duration) -> bool {
        match self.sessions.get_mut(key) {
            Some(mut session) if !session.authenticated && session.reminder_due(now, interval) => {
                session.last_reminder_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of every session. Order is unspecified.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
