//! Shared vocabulary for Warden.
//!
//! - **Identity** ([`IdentityKey`]) — the normalized name every lookup
//!   is keyed by.
//! - **Geometry** ([`Position`], [`Orientation`], [`PlayMode`]) — the
//!   small slice of the game world Warden needs to freeze players in
//!   place until they log in.
//!
//! ```text
//! warden (flow, gate, sweep)
//!     ↕
//! warden-store / warden-session
//!     ↕
//! warden-types (this crate)
//! ```

mod geometry;
mod identity;

pub use geometry::{ANCHOR_EPSILON_SQ, Orientation, PlayMode, Position};
pub use identity::{IdentityKey, RECORD_DELIMITER, is_valid_name};
