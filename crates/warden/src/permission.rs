//! Permission checks for the administrative commands.
//!
//! Many servers run a permission plugin that maps nodes like
//! `warden.allowlist.add` to groups. Some don't. [`Permissions`] is the
//! capability chosen once at startup:
//!
//! - [`Permissions::External`] asks a [`PermissionAuthority`] and falls
//!   back to the fixed policy if the authority errors.
//! - [`Permissions::Default`] always applies the fixed policy.
//!
//! The fixed policy: the console may do anything; a node whose default
//! is "allowed" is allowed for everyone; otherwise the player must be
//! elevated (operator).

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::CommandSource;

/// Node guarding `allowlist add`.
pub const NODE_ALLOWLIST_ADD: &str = "warden.allowlist.add";
/// Node guarding `allowlist remove`.
pub const NODE_ALLOWLIST_REMOVE: &str = "warden.allowlist.remove";

/// An external permission system.
///
/// # Trait bounds
///
/// - `Send + Sync` → commands execute on whatever thread the host uses.
/// - `'static` → it lives as long as the server.
pub trait PermissionAuthority: Send + Sync + 'static {
    /// Decides whether `source` holds `node`. `default` is the answer the
    /// authority should give for nodes nobody configured.
    ///
    /// `Err` means the authority could not answer at all; the caller then
    /// uses the fixed policy. The string is only logged.
    fn check(&self, source: &CommandSource, node: &str, default: bool) -> Result<bool, String>;
}

/// The permission capability in use.
pub enum Permissions {
    External(Box<dyn PermissionAuthority>),
    Default,
}

impl Permissions {
    /// Wraps an external authority.
    pub fn external(authority: impl PermissionAuthority) -> Self {
        Self::External(Box::new(authority))
    }

    /// Returns whether `source` may use the command guarded by `node`.
    pub fn has_permission(&self, source: &CommandSource, node: &str, default: bool) -> bool {
        match self {
            Self::External(authority) => match authority.check(source, node, default) {
                Ok(allowed) => allowed,
                Err(reason) => {
                    warn!(node, %reason, "permission authority failed, using fallback policy");
                    fallback(source, default)
                }
            },
            Self::Default => {
                announce_fallback();
                fallback(source, default)
            }
        }
    }
}

impl std::fmt::Debug for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External(_) => f.write_str("Permissions::External"),
            Self::Default => f.write_str("Permissions::Default"),
        }
    }
}

fn fallback(source: &CommandSource, default: bool) -> bool {
    match source {
        CommandSource::Console => true,
        CommandSource::Player { .. } if default => true,
        CommandSource::Player { elevated, .. } => *elevated,
    }
}

static FALLBACK_ANNOUNCED: AtomicBool = AtomicBool::new(false);

fn announce_fallback() {
    if FALLBACK_ANNOUNCED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        info!("no permission authority configured, falling back to operator checks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<bool, String>);

    impl PermissionAuthority for Fixed {
        fn check(&self, _: &CommandSource, _: &str, _: bool) -> Result<bool, String> {
            self.0.clone()
        }
    }

    #[test]
    fn test_default_console_always_permitted() {
        let perms = Permissions::Default;
        assert!(perms.has_permission(&CommandSource::Console, NODE_ALLOWLIST_REMOVE, false));
    }

    #[test]
    fn test_default_allow_node_permits_anyone() {
        let perms = Permissions::Default;
        assert!(perms.has_permission(&CommandSource::player("Alice"), NODE_ALLOWLIST_ADD, true));
    }

    #[test]
    fn test_default_deny_node_requires_elevation() {
        let perms = Permissions::Default;
        assert!(!perms.has_permission(&CommandSource::player("Alice"), NODE_ALLOWLIST_REMOVE, false));
        assert!(perms.has_permission(&CommandSource::operator("Op"), NODE_ALLOWLIST_REMOVE, false));
    }

    #[test]
    fn test_external_answer_wins_over_default() {
        let perms = Permissions::external(Fixed(Ok(false)));
        assert!(!perms.has_permission(&CommandSource::Console, NODE_ALLOWLIST_ADD, true));

        let perms = Permissions::external(Fixed(Ok(true)));
        assert!(perms.has_permission(&CommandSource::player("Alice"), NODE_ALLOWLIST_REMOVE, false));
    }

    #[test]
    fn test_external_error_falls_back() {
        let perms = Permissions::external(Fixed(Err("plugin unloaded".into())));
        assert!(!perms.has_permission(&CommandSource::player("Alice"), NODE_ALLOWLIST_REMOVE, false));
        assert!(perms.has_permission(&CommandSource::operator("Op"), NODE_ALLOWLIST_REMOVE, false));
    }
}
