//! The seam between Warden and the game server that embeds it.
//!
//! Warden doesn't own connections, entities, or chat. The host does.
//! Instead, Warden defines the [`PlayerHost`] trait: the handful of
//! player-entity and messaging calls it needs, keyed by the player's
//! display name. The host implements it over its own API, and tests
//! implement it with a recording mock.
//!
//! The other direction (host → Warden) is plain method calls on
//! [`Warden`](crate::Warden): `on_join`, `on_disconnect`,
//! `on_command_attempt`, `execute`, `on_tick`.

use warden_types::{Orientation, PlayMode, Position};

/// A connected player as the host currently sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlinePlayer {
    pub name: String,
    pub position: Position,
    pub orientation: Orientation,
}

impl OnlinePlayer {
    pub fn new(name: impl Into<String>, position: Position, orientation: Orientation) -> Self {
        Self {
            name: name.into(),
            position,
            orientation,
        }
    }
}

/// Player-entity control and messaging, implemented by the game server.
///
/// # Trait bounds
///
/// - `Send + Sync` → the host is called from join callbacks, command
///   execution and the heartbeat, possibly on different threads.
/// - `'static` → it lives as long as the server.
///
/// Every method addresses the player by display name. Calls for a player
/// who has already left must be harmless no-ops.
pub trait PlayerHost: Send + Sync + 'static {
    /// Every currently connected player with their live position.
    fn online_players(&self) -> Vec<OnlinePlayer>;

    /// Stops all movement of the player's entity.
    fn set_velocity_zero(&self, name: &str);

    /// Moves the player's entity to `position` facing `orientation`.
    fn teleport(&self, name: &str, position: Position, orientation: Orientation);

    /// Switches the player between restricted and normal play.
    fn set_play_mode(&self, name: &str, mode: PlayMode);

    /// Closes the player's connection, showing `message` as the reason.
    fn disconnect(&self, name: &str, message: &str);

    /// Sends a chat/system message to the player.
    fn send_message(&self, name: &str, message: &str);
}

/// Who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    /// A connected player. `elevated` is the host's notion of operator
    /// privilege, consulted only when no permission authority decides.
    Player { name: String, elevated: bool },
    /// The server console. Always trusted.
    Console,
}

impl CommandSource {
    /// A non-elevated player source.
    pub fn player(name: impl Into<String>) -> Self {
        Self::Player {
            name: name.into(),
            elevated: false,
        }
    }

    /// An elevated (operator) player source.
    pub fn operator(name: impl Into<String>) -> Self {
        Self::Player {
            name: name.into(),
            elevated: true,
        }
    }

    /// The player's name, or `None` for the console.
    pub fn player_name(&self) -> Option<&str> {
        match self {
            Self::Player { name, .. } => Some(name),
            Self::Console => None,
        }
    }

    /// How this source appears in logs.
    pub fn describe(&self) -> &str {
        self.player_name().unwrap_or("Server")
    }
}
