//! Parsing of raw command text into Warden commands.
//!
//! The host hands over the command line exactly as typed (with or
//! without the leading `/`). Parsing is a pure function of that text:
//!
//! ```text
//! "/login hunter22"        → Parsed::Command(Command::Login(..))
//! "register"               → Parsed::Usage(USAGE_REGISTER)
//! "allowlist add Alice"    → Parsed::Command(Command::AllowlistAdd("Alice"))
//! "tp 0 64 0"              → Parsed::NotOurs
//! ```
//!
//! Command words are case-insensitive. Arguments are whitespace
//! delimited and each command takes exactly one, so a password can never
//! contain spaces.

use warden_session::Password;

use crate::notice;

/// A recognized Warden command.
#[derive(Debug)]
pub enum Command {
    Register(Password),
    Login(Password),
    AllowlistAdd(String),
    AllowlistRemove(String),
}

impl Command {
    /// The command word, for logs. Never includes arguments.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Login(_) => "login",
            Self::AllowlistAdd(_) => "allowlist add",
            Self::AllowlistRemove(_) => "allowlist remove",
        }
    }
}

/// Result of [`parse`].
#[derive(Debug)]
pub enum Parsed {
    /// A well-formed Warden command.
    Command(Command),
    /// A Warden command word with the wrong arguments. Carries the usage
    /// text to send back.
    Usage(&'static str),
    /// Not a Warden command; the host should process it normally.
    NotOurs,
}

/// Lower-cased first word of `raw`, without a leading `/`.
///
/// Returns an empty string for blank input.
pub fn command_word(raw: &str) -> String {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Parses one command line.
pub fn parse(raw: &str) -> Parsed {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let mut tokens = trimmed.split_whitespace();

    let Some(word) = tokens.next() else {
        return Parsed::NotOurs;
    };

    match word.to_lowercase().as_str() {
        "register" => match single(tokens) {
            Some(password) => Parsed::Command(Command::Register(Password::new(password.to_string()))),
            None => Parsed::Usage(notice::USAGE_REGISTER),
        },
        "login" => match single(tokens) {
            Some(password) => Parsed::Command(Command::Login(Password::new(password.to_string()))),
            None => Parsed::Usage(notice::USAGE_LOGIN),
        },
        "allowlist" => {
            let action = tokens.next().map(str::to_lowercase);
            match (action.as_deref(), single(tokens)) {
                (Some("add"), Some(name)) => Parsed::Command(Command::AllowlistAdd(name.to_string())),
                (Some("remove"), Some(name)) => {
                    Parsed::Command(Command::AllowlistRemove(name.to_string()))
                }
                _ => Parsed::Usage(notice::USAGE_ALLOWLIST),
            }
        }
        _ => Parsed::NotOurs,
    }
}

/// The only remaining token, or `None` if there are zero or several.
fn single<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let first = tokens.next()?;
    match tokens.next() {
        Some(_) => None,
        None => Some(first),
    }
}
