//! # Warden
//!
//! Allow-list and password gate for multiplayer game servers.
//!
//! A connecting player must be on a persisted allow-list, and must log in
//! (or register a password on first contact) before getting normal play.
//! Until then they are frozen in place, every command except `login` and
//! `register` is swallowed, and they are disconnected if they don't
//! authenticate within the login timeout.
//!
//! The host game server implements [`PlayerHost`] and forwards its
//! connection events, command attempts and ticks to a [`Warden`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden::prelude::*;
//!
//! // Implement PlayerHost for your server, then:
//! // let warden = WardenBuilder::new()
//! //     .data_dir("config")
//! //     .build(my_host)?;
//! // warden.on_join(&player);
//! // if warden.on_command_attempt(name, raw).is_blocked() { return; }
//! // if let Some(reply) = warden.execute(&source, raw) { /* send reply */ }
//! // warden.on_tick(now);
//! ```

mod config;
mod error;
mod host;
mod warden;

pub mod command;
pub mod flow;
pub mod gate;
pub mod heartbeat;
pub mod notice;
pub mod permission;
pub mod sweep;

pub use config::WardenConfig;
pub use error::{AuthError, AuthErrorKind, WardenError};
pub use host::{CommandSource, OnlinePlayer, PlayerHost};
pub use warden::{JoinOutcome, Warden, WardenBuilder};

/// Everything a host integration usually needs.
pub mod prelude {
    pub use crate::flow::Authenticated;
    pub use crate::gate::Verdict;
    pub use crate::heartbeat::{Heartbeat, drive};
    pub use crate::permission::{PermissionAuthority, Permissions};
    pub use crate::sweep::SweepReport;
    pub use crate::{
        AuthError, AuthErrorKind, CommandSource, JoinOutcome, OnlinePlayer, PlayerHost, Warden,
        WardenBuilder, WardenConfig, WardenError,
    };
    pub use warden_session::{Argon2Hasher, Password, PasswordHasher};
    pub use warden_store::{CommandAccess, CredentialStore, PolicyConfig};
    pub use warden_types::{IdentityKey, Orientation, PlayMode, Position};
}
