//! Player-facing message texts.
//!
//! Rejections from the register/login flow render through
//! [`AuthError`](crate::AuthError)'s `Display`. Everything else a player
//! or operator can see is here, so a host that wants to translate them
//! has one place to look.

pub const NOT_AUTHORIZED_TO_JOIN: &str = "You are not authorized to join this server.";
pub const NO_LONGER_AUTHORIZED: &str = "You are no longer authorized to play on this server.";
pub const LOGIN_TIMED_OUT: &str = "Login timed out. Please reconnect and try again.";

pub const PROMPT_LOGIN: &str = "Please login with /login <password> to start playing.";
pub const PROMPT_REGISTER: &str = "Please register with /register <password> to start playing.";
pub const REMINDER: &str = "Please authenticate with /login <password> or /register <password>.";

pub const REGISTERED: &str = "Registration successful. You are now logged in.";
pub const LOGGED_IN: &str = "Login successful. Welcome!";

pub const USAGE_REGISTER: &str = "Usage: /register <password>";
pub const USAGE_LOGIN: &str = "Usage: /login <password>";
pub const USAGE_ALLOWLIST: &str = "Usage: /allowlist <add|remove> <name>";
pub const PLAYERS_ONLY: &str = "Only players may use this command.";
pub const NO_PERMISSION: &str = "You do not have permission to use this command.";

pub fn added(name: &str) -> String {
    format!("Added {name} to the allow-list.")
}

pub fn already_listed(name: &str) -> String {
    format!("{name} is already allow-listed.")
}

pub fn removed(name: &str) -> String {
    format!("Removed {name} from the allow-list.")
}

pub fn not_listed(name: &str) -> String {
    format!("{name} is not currently allow-listed.")
}

pub fn invalid_name(name: &str) -> String {
    format!("'{name}' is not a valid player name.")
}
