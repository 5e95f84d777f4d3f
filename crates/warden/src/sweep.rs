//! The enforcement sweep, run once per heartbeat tick.
//!
//! Three independent passes:
//!
//! 1. **Timeout** (every tick): unauthenticated players past the login
//!    timeout are disconnected.
//! 2. **Freeze** (every tick): unauthenticated players have their
//!    velocity zeroed and are teleported back to where they joined if
//!    they drifted.
//! 3. **Audit** (every `audit_interval_ticks`): every connected player,
//!    authenticated or not, is re-checked against the allow-list, so a
//!    removal takes effect within one interval.
//!
//! Each pass takes a snapshot first and acts second. No session-table
//! guard is held while calling into the host.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, trace, warn};
use warden_session::SessionTable;
use warden_store::CredentialStore;
use warden_types::IdentityKey;

use crate::{PlayerHost, notice};

/// What one [`EnforcementSweep::run`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tick number of this run (starts at 1).
    pub tick: u64,
    /// Players disconnected for not authenticating in time.
    pub timed_out: usize,
    /// Players teleported back to their anchor.
    pub teleported: usize,
    /// Whether the audit pass ran on this tick.
    pub audited: bool,
    /// Players disconnected because they are no longer allow-listed.
    pub revoked: usize,
}

/// Tick counter plus the three passes.
#[derive(Debug)]
pub struct EnforcementSweep {
    audit_interval_ticks: u64,
    ticks: AtomicU64,
}

impl EnforcementSweep {
    pub fn new(audit_interval_ticks: u64) -> Self {
        Self {
            audit_interval_ticks: audit_interval_ticks.max(1),
            ticks: AtomicU64::new(0),
        }
    }

    /// Runs one tick's worth of enforcement.
    pub fn run(
        &self,
        host: &dyn PlayerHost,
        store: &CredentialStore,
        sessions: &SessionTable,
        now: Instant,
    ) -> SweepReport {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let audited = tick % self.audit_interval_ticks == 0;

        let report = SweepReport {
            tick,
            timed_out: timeout_pass(host, store, sessions, now),
            teleported: freeze_pass(host, sessions),
            audited,
            revoked: if audited {
                audit_pass(host, store, sessions)
            } else {
                0
            },
        };
        trace!(?report, "sweep");
        report
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Disconnects every unauthenticated session that has been waiting for
/// at least the store's login timeout. Returns how many were removed.
pub fn timeout_pass(
    host: &dyn PlayerHost,
    store: &CredentialStore,
    sessions: &SessionTable,
    now: Instant,
) -> usize {
    let timeout = store.login_timeout();
    let expired: Vec<_> = sessions
        .snapshot()
        .into_iter()
        .filter(|s| s.has_timed_out(now, timeout))
        .collect();

    for session in &expired {
        warn!(
            player = %session.display_name,
            timeout_secs = timeout.as_secs(),
            "kicking for failing to authenticate in time"
        );
        host.disconnect(&session.display_name, notice::LOGIN_TIMED_OUT);
        sessions.end(&session.identity_key);
    }
    expired.len()
}

/// Pins every unauthenticated, connected player to their anchor. Returns
/// how many had to be teleported back.
pub fn freeze_pass(host: &dyn PlayerHost, sessions: &SessionTable) -> usize {
    let mut teleported = 0;
    for player in host.online_players() {
        let Some(key) = IdentityKey::from_name(&player.name) else {
            continue;
        };
        let Some(session) = sessions.get(&key) else {
            continue;
        };
        if session.authenticated {
            continue;
        }

        host.set_velocity_zero(&player.name);
        if player.position.drifted_from(&session.anchor_position) {
            host.teleport(
                &player.name,
                session.anchor_position,
                session.anchor_orientation,
            );
            teleported += 1;
        }
    }
    teleported
}

/// Disconnects every connected player who is no longer allow-listed.
/// Returns how many were removed.
pub fn audit_pass(host: &dyn PlayerHost, store: &CredentialStore, sessions: &SessionTable) -> usize {
    let revoked: Vec<_> = host
        .online_players()
        .into_iter()
        .filter(|p| !store.is_allowed(&p.name))
        .collect();

    for player in &revoked {
        warn!(player = %player.name, "kicking: no longer allow-listed");
        host.disconnect(&player.name, notice::NO_LONGER_AUTHORIZED);
        if let Some(key) = IdentityKey::from_name(&player.name) {
            sessions.end(&key);
        }
    }
    debug!(revoked = revoked.len(), "allow-list audit complete");
    revoked.len()
}
