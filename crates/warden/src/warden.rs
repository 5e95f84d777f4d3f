//! `Warden` builder and composition root.
//!
//! This is the entry point a host talks to. It ties together all the
//! layers: store → sessions → flow/gate/sweep, and turns their outcomes
//! into calls on the host (play mode, messages, disconnects).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use warden_session::{Argon2Hasher, PasswordHasher, SessionTable};
use warden_store::CredentialStore;
use warden_types::{IdentityKey, PlayMode};

use crate::command::{self, Command, Parsed};
use crate::flow::{Authenticated, AuthenticationFlow};
use crate::gate::{self, Verdict};
use crate::permission::{self, PermissionAuthority, Permissions};
use crate::sweep::{EnforcementSweep, SweepReport};
use crate::{
    AuthError, AuthErrorKind, CommandSource, OnlinePlayer, PlayerHost, WardenConfig, WardenError,
    notice,
};

/// What happened when a player joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Not allow-listed; the connection was closed.
    Rejected,
    /// Allow-listed with a password; asked to log in.
    AwaitingLogin,
    /// Allow-listed without a password; asked to register.
    AwaitingRegistration,
}

/// Builder for configuring a [`Warden`].
///
/// # Example
///
/// ```rust,ignore
/// let warden = WardenBuilder::new()
///     .data_dir("config")
///     .tick_rate(20)
///     .build(my_host)?;
/// ```
pub struct WardenBuilder {
    config: WardenConfig,
    hasher: Option<Box<dyn PasswordHasher>>,
    hash_cost: Option<(u32, u32, u32)>,
    permissions: Permissions,
}

impl WardenBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WardenConfig::default(),
            hasher: None,
            hash_cost: None,
            permissions: Permissions::Default,
        }
    }

    /// Replaces the whole process configuration.
    pub fn config(mut self, config: WardenConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the directory holding the store files.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Sets the heartbeat rate in Hz.
    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    /// Sets how many ticks pass between allow-list audits.
    pub fn audit_interval_ticks(mut self, ticks: u64) -> Self {
        self.config.audit_interval_ticks = ticks;
        self
    }

    /// Sets the minimum gap between login reminders.
    pub fn reminder_interval(mut self, interval: Duration) -> Self {
        self.config.reminder_interval = interval;
        self
    }

    /// Uses a custom password hasher instead of Argon2id.
    pub fn hasher(mut self, hasher: impl PasswordHasher) -> Self {
        self.hasher = Some(Box::new(hasher));
        self
    }

    /// Uses Argon2id with a custom cost (memory KiB, passes, lanes).
    /// Ignored if [`hasher`](Self::hasher) is also set.
    pub fn hash_cost(mut self, m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Self {
        self.hash_cost = Some((m_cost_kib, t_cost, p_cost));
        self
    }

    /// Delegates permission checks to an external authority.
    pub fn permission_authority(mut self, authority: impl PermissionAuthority) -> Self {
        self.permissions = Permissions::external(authority);
        self
    }

    /// Opens the store and assembles the [`Warden`].
    ///
    /// The store itself never fails to open (it falls back to backup,
    /// then defaults). The only error is an invalid hash cost.
    pub fn build<H: PlayerHost>(self, host: H) -> Result<Warden<H>, WardenError> {
        let config = self.config.validated();

        let hasher: Box<dyn PasswordHasher> = match (self.hasher, self.hash_cost) {
            (Some(hasher), _) => hasher,
            (None, Some((m, t, p))) => Box::new(Argon2Hasher::with_cost(m, t, p)?),
            (None, None) => Box::new(Argon2Hasher::new()),
        };

        let store = CredentialStore::open(config.data_dir.clone());
        info!(
            data_dir = %config.data_dir.display(),
            allow_listed = store.len(),
            permissions = ?self.permissions,
            "warden ready"
        );

        Ok(Warden {
            sweep: EnforcementSweep::new(config.audit_interval_ticks),
            config,
            host,
            store,
            sessions: SessionTable::new(),
            hasher,
            permissions: self.permissions,
        })
    }
}

impl Default for WardenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The allow-list and login gate, wired to a host.
///
/// `Warden` is `Send + Sync`; share it as `Arc<Warden<H>>` between the
/// host's event callbacks and the heartbeat.
pub struct Warden<H: PlayerHost> {
    config: WardenConfig,
    host: H,
    store: CredentialStore,
    sessions: SessionTable,
    hasher: Box<dyn PasswordHasher>,
    permissions: Permissions,
    sweep: EnforcementSweep,
}

impl<H: PlayerHost> Warden<H> {
    /// Creates a new builder.
    pub fn builder() -> WardenBuilder {
        WardenBuilder::new()
    }

    // -- Connection events -------------------------------------------------

    /// Handles a player connecting.
    ///
    /// Players not on the allow-list are disconnected right away and get
    /// no session. Everyone else is put into restricted play, pinned to
    /// where they stand, and asked to log in or register.
    pub fn on_join(&self, player: &OnlinePlayer) -> JoinOutcome {
        let name = player.name.as_str();
        let key = match IdentityKey::from_name(name) {
            Some(key) if self.store.is_allowed(name) => key,
            _ => {
                warn!(player = %name, "rejected connection: not allow-listed");
                self.host.disconnect(name, notice::NOT_AUTHORIZED_TO_JOIN);
                return JoinOutcome::Rejected;
            }
        };

        self.sessions
            .start(key, name, player.position, player.orientation, now());
        self.store.refresh_display_name(name);
        self.host.set_play_mode(name, PlayMode::Restricted);

        let outcome = if self.store.has_password_hash(name) {
            self.host.send_message(name, notice::PROMPT_LOGIN);
            JoinOutcome::AwaitingLogin
        } else {
            self.host.send_message(name, notice::PROMPT_REGISTER);
            JoinOutcome::AwaitingRegistration
        };
        info!(player = %name, ?outcome, "joined pending authentication");
        outcome
    }

    /// Handles a player leaving. Safe to call for anyone, any number of
    /// times.
    pub fn on_disconnect(&self, name: &str) {
        if let Some(key) = IdentityKey::from_name(name) {
            self.sessions.end(&key);
        }
    }

    /// Decides whether a command typed by player `name` may run.
    ///
    /// Sends the rate-limited login reminder itself when blocking.
    pub fn on_command_attempt(&self, name: &str, raw: &str) -> Verdict {
        let Some(key) = IdentityKey::from_name(name) else {
            return Verdict::Allow;
        };
        let verdict = gate::check(
            &self.sessions,
            &key,
            raw,
            now(),
            self.config.reminder_interval,
        );
        if let Verdict::Block { remind: true } = verdict {
            self.host.send_message(name, notice::REMINDER);
        }
        verdict
    }

    /// Runs a Warden command.
    ///
    /// Returns `None` if `raw` is not a Warden command (the host should
    /// process it normally), otherwise the reply text for `source`.
    pub fn execute(&self, source: &CommandSource, raw: &str) -> Option<String> {
        let command = match command::parse(raw) {
            Parsed::NotOurs => return None,
            Parsed::Usage(usage) => return Some(usage.to_string()),
            Parsed::Command(command) => command,
        };
        debug!(command = command.name(), by = source.describe(), "running command");

        let reply = match command {
            Command::Register(password) => match source.player_name() {
                Some(name) => self.finish_auth(name, self.flow().register(name, password)),
                None => notice::PLAYERS_ONLY.to_string(),
            },
            Command::Login(password) => match source.player_name() {
                Some(name) => self.finish_auth(name, self.flow().login(name, password)),
                None => notice::PLAYERS_ONLY.to_string(),
            },
            Command::AllowlistAdd(name) => self.allowlist_add(source, &name),
            Command::AllowlistRemove(name) => self.allowlist_remove(source, &name),
        };
        Some(reply)
    }

    /// Runs one heartbeat's worth of enforcement.
    pub fn on_tick(&self, now: Instant) -> SweepReport {
        self.sweep.run(&self.host, &self.store, &self.sessions, now)
    }

    // -- Accessors ---------------------------------------------------------

    /// Writes the store to disk.
    pub fn save(&self) -> Result<(), WardenError> {
        self.store.save()?;
        Ok(())
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    // -- Internals ---------------------------------------------------------

    fn flow(&self) -> AuthenticationFlow<'_> {
        AuthenticationFlow::new(&self.store, &self.sessions, self.hasher.as_ref())
    }

    /// Applies a register/login outcome to the host and returns the reply.
    fn finish_auth(&self, name: &str, result: Result<Authenticated, AuthError>) -> String {
        match result {
            Ok(how) => {
                self.host.set_play_mode(name, PlayMode::Normal);
                match how {
                    Authenticated::Registered => notice::REGISTERED.to_string(),
                    Authenticated::LoggedIn => notice::LOGGED_IN.to_string(),
                }
            }
            Err(e) => {
                let text = e.to_string();
                if e.kind() == AuthErrorKind::LockedOut {
                    self.host.disconnect(name, &text);
                }
                text
            }
        }
    }

    fn allowlist_add(&self, source: &CommandSource, name: &str) -> String {
        let allowed_by_default = self.store.command_access().allow_add_for_everyone;
        if !self.permissions.has_permission(
            source,
            permission::NODE_ALLOWLIST_ADD,
            allowed_by_default,
        ) {
            return notice::NO_PERMISSION.to_string();
        }
        if IdentityKey::from_name(name).is_none() {
            return notice::invalid_name(name);
        }

        if !self.store.add(name) {
            return notice::already_listed(name);
        }
        self.persist("allow-list add");
        info!(by = source.describe(), player = %name, "added to allow-list");
        notice::added(name)
    }

    /// Removes `name` from the allow-list. A connected player is not
    /// kicked here; the next audit pass does that.
    fn allowlist_remove(&self, source: &CommandSource, name: &str) -> String {
        let allowed_by_default = self.store.command_access().allow_remove_for_everyone;
        if !self.permissions.has_permission(
            source,
            permission::NODE_ALLOWLIST_REMOVE,
            allowed_by_default,
        ) {
            return notice::NO_PERMISSION.to_string();
        }

        if !self.store.remove(name) {
            return notice::not_listed(name);
        }
        self.persist("allow-list remove");
        info!(by = source.describe(), player = %name, "removed from allow-list");
        notice::removed(name)
    }

    fn persist(&self, what: &str) {
        if let Err(e) = self.store.save() {
            error!(error = %e, change = what, "failed to persist store");
        }
    }
}

/// Current time on the Tokio clock, so paused-time tests can move it.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
