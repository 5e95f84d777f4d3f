//! Shared test host for the Warden integration tests.
//!
//! `RecordingHost` keeps a list of online players and records every call
//! Warden makes into it, so tests can assert on side effects in order.

#![allow(dead_code)]

use std::path::Path;

use parking_lot::Mutex;
use warden::prelude::*;

/// One call Warden made into the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    VelocityZero(String),
    Teleport(String, Position),
    PlayMode(String, PlayMode),
    Disconnect(String, String),
    Message(String, String),
}

#[derive(Default)]
pub struct RecordingHost {
    online: Mutex<Vec<OnlinePlayer>>,
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    /// Adds a player to the online list (the host-side half of a join).
    pub fn connect(&self, player: OnlinePlayer) {
        self.online.lock().push(player);
    }

    /// Drops a player from the online list without recording anything,
    /// as when the client quits on its own.
    pub fn quit(&self, name: &str) {
        self.online.lock().retain(|p| p.name != name);
    }

    /// Moves an online player.
    pub fn move_to(&self, name: &str, position: Position) {
        if let Some(p) = self.online.lock().iter_mut().find(|p| p.name == name) {
            p.position = position;
        }
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.online.lock().iter().any(|p| p.name == name)
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Every message sent to `name`, oldest first.
    pub fn messages_to(&self, name: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Message(to, text) if to == name => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The disconnect reason given to `name`, if they were disconnected.
    pub fn disconnect_reason(&self, name: &str) -> Option<String> {
        self.events.lock().iter().find_map(|e| match e {
            HostEvent::Disconnect(who, reason) if who == name => Some(reason.clone()),
            _ => None,
        })
    }

    pub fn last_play_mode(&self, name: &str) -> Option<PlayMode> {
        self.events.lock().iter().rev().find_map(|e| match e {
            HostEvent::PlayMode(who, mode) if who == name => Some(*mode),
            _ => None,
        })
    }

    pub fn teleports(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, HostEvent::Teleport(who, _) if who == name))
            .count()
    }

    fn record(&self, event: HostEvent) {
        self.events.lock().push(event);
    }
}

impl PlayerHost for RecordingHost {
    fn online_players(&self) -> Vec<OnlinePlayer> {
        self.online.lock().clone()
    }

    fn set_velocity_zero(&self, name: &str) {
        self.record(HostEvent::VelocityZero(name.to_string()));
    }

    fn teleport(&self, name: &str, position: Position, _orientation: Orientation) {
        self.move_to(name, position);
        self.record(HostEvent::Teleport(name.to_string(), position));
    }

    fn set_play_mode(&self, name: &str, mode: PlayMode) {
        self.record(HostEvent::PlayMode(name.to_string(), mode));
    }

    fn disconnect(&self, name: &str, message: &str) {
        self.online.lock().retain(|p| p.name != name);
        self.record(HostEvent::Disconnect(name.to_string(), message.to_string()));
    }

    fn send_message(&self, name: &str, message: &str) {
        self.record(HostEvent::Message(name.to_string(), message.to_string()));
    }
}

// =========================================================================
// Helpers
// =========================================================================

pub const SPAWN: Position = Position::new(0.0, 64.0, 0.0);

/// A Warden over a fresh `RecordingHost`, with a cheap hash cost.
pub fn warden_in(dir: &Path) -> Warden<RecordingHost> {
    warden_with(Warden::<RecordingHost>::builder().data_dir(dir))
}

pub fn warden_with(builder: WardenBuilder) -> Warden<RecordingHost> {
    builder
        .hash_cost(8, 1, 1)
        .build(RecordingHost::default())
        .expect("test warden should build")
}

pub fn player(name: &str) -> OnlinePlayer {
    OnlinePlayer::new(name, SPAWN, Orientation::new(90.0, 0.0))
}

/// Host-side connect followed by Warden's join handling.
pub fn join(warden: &Warden<RecordingHost>, name: &str) -> JoinOutcome {
    let p = player(name);
    warden.host().connect(p.clone());
    warden.on_join(&p)
}

/// Client quits: host drops the connection, then tells Warden.
pub fn leave(warden: &Warden<RecordingHost>, name: &str) {
    warden.host().quit(name);
    warden.on_disconnect(name);
}

/// Joins `name` and registers `password` for them.
pub fn join_and_register(warden: &Warden<RecordingHost>, name: &str, password: &str) {
    join(warden, name);
    let reply = warden.execute(&CommandSource::player(name), &format!("/register {password}"));
    assert_eq!(reply.as_deref(), Some(warden::notice::REGISTERED));
}

/// Tokio's clock as a std `Instant`, matching what Warden reads.
pub fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
