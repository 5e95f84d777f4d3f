//! Durable credential store for Warden.
//!
//! Holds three things, all persisted together in one JSON document:
//!
//! 1. **The allow-list** — which identities may connect at all.
//! 2. **Password hashes** — one optional hash per allow-listed identity.
//! 3. **Policy** ([`PolicyConfig`], [`CommandAccess`]) — password length,
//!    attempt limit, login timeout, and command defaults.
//!
//! The store never hashes anything itself; it only keeps the strings the
//! session layer's password primitive produces.

mod document;
mod error;
mod policy;
mod store;

pub use document::CredentialRecord;
pub use error::StoreError;
pub use policy::{CommandAccess, PolicyConfig};
pub use store::{BACKUP_FILE, CredentialStore, LoadSource, PRIMARY_FILE};
