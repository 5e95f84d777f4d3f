//! Live authentication sessions for Warden.
//!
//! This crate handles the in-memory side of authentication:
//!
//! 1. **Session tracking** — who is connected and whether they've logged
//!    in yet ([`SessionTable`], [`Session`])
//! 2. **Password primitive** — wiping plaintext and hashing/verifying it
//!    ([`Password`], [`PasswordHasher`], [`Argon2Hasher`])
//!
//! # How it fits in the stack
//!
//! ```text
//! warden (above)  ← runs the register/login flow, gates commands, sweeps
//!     ↕
//! Session layer (this crate)  ← live per-connection auth state
//!     ↕
//! warden-types (below)  ← IdentityKey, Position, Orientation
//! ```

mod error;
mod password;
mod session;
mod table;

pub use error::SessionError;
pub use password::{Argon2Hasher, Password, PasswordHasher};
pub use session::Session;
pub use table::SessionTable;
