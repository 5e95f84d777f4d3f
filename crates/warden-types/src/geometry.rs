//! World geometry as seen through the host's player-entity API.
//!
//! Warden never simulates anything. It only needs to remember where a
//! player stood when they joined (the "anchor") and put them back there
//! if they drift before authenticating.

use serde::{Deserialize, Serialize};

/// Squared distance beyond which an unauthenticated player counts as
/// having moved off their anchor.
pub const ANCHOR_EPSILON_SQ: f64 = 0.0001;

/// A point in the game world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance. Cheaper than `distance` and all we need
    /// for a threshold comparison.
    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Returns `true` if `self` has drifted away from `anchor`.
    pub fn drifted_from(&self, anchor: &Position) -> bool {
        self.distance_sq(anchor) > ANCHOR_EPSILON_SQ
    }
}

/// Where a player is looking, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Orientation {
    pub const fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

/// The play mode Warden asks the host to apply.
///
/// Hosts map these onto their own modes. A typical mapping is
/// `Restricted` → spectator and `Normal` → survival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Waiting for authentication: no interaction with the world.
    Restricted,
    /// Authenticated: regular play.
    Normal,
}
