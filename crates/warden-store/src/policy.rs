//! Tunable policy values persisted alongside the credentials.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

// ---------------------------------------------------------------------------
// PolicyConfig
// ---------------------------------------------------------------------------

/// Authentication policy. Always within bounds once it leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Minimum password length, in characters.
    pub min_password_length: u32,
    /// Wrong passwords allowed before the connection is terminated.
    pub max_login_attempts: u32,
    /// Seconds an unauthenticated player may stay connected.
    pub login_timeout_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_password_length: 5,
            max_login_attempts: 5,
            login_timeout_secs: 300,
        }
    }
}

impl PolicyConfig {
    /// Lower bound for `min_password_length`.
    pub const MIN_PASSWORD_LENGTH_FLOOR: u32 = 1;
    /// Upper bound for `min_password_length`, and the longest password
    /// (in bytes) Warden accepts at registration.
    pub const PASSWORD_INPUT_LIMIT: u32 = 72;
    /// Lower bound for `max_login_attempts`.
    pub const MIN_LOGIN_ATTEMPTS: u32 = 1;
    /// Lower bound for `login_timeout_secs`.
    pub const MIN_LOGIN_TIMEOUT_SECS: u64 = 10;

    /// The login timeout as a `Duration`.
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Raw (on-disk) policy
// ---------------------------------------------------------------------------

/// Policy exactly as found in the store file.
///
/// Fields are signed and optional so that a negative or missing value is
/// still parsed and can be clamped, instead of failing the whole
/// document and dropping to the backup. Each field is read leniently: a
/// fractional number is truncated, a numeric string is parsed, and
/// anything else falls back to the default for that field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPolicy {
    #[serde(default, deserialize_with = "lenient_int")]
    pub min_password_length: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub max_login_attempts: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub login_timeout_seconds: Option<i64>,
}

/// Reads one policy field from whatever JSON value is there.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(int_from_value))
}

fn int_from_value(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    };
    if parsed.is_none() {
        warn!(%value, "policy value is not a number, using default");
    }
    parsed
}

impl RawPolicy {
    /// Clamps every field into range. Invalid input is sanitized, never
    /// rejected.
    pub fn sanitize(&self) -> PolicyConfig {
        let defaults = PolicyConfig::default();

        let min_password_length = clamp_field(
            "minPasswordLength",
            self.min_password_length,
            defaults.min_password_length as i64,
            PolicyConfig::MIN_PASSWORD_LENGTH_FLOOR as i64,
            PolicyConfig::PASSWORD_INPUT_LIMIT as i64,
        );
        let max_login_attempts = clamp_field(
            "maxLoginAttempts",
            self.max_login_attempts,
            defaults.max_login_attempts as i64,
            PolicyConfig::MIN_LOGIN_ATTEMPTS as i64,
            u32::MAX as i64,
        );
        let login_timeout_seconds = clamp_field(
            "loginTimeoutSeconds",
            self.login_timeout_seconds,
            defaults.login_timeout_secs as i64,
            PolicyConfig::MIN_LOGIN_TIMEOUT_SECS as i64,
            i64::MAX,
        );

        PolicyConfig {
            min_password_length: min_password_length as u32,
            max_login_attempts: max_login_attempts as u32,
            login_timeout_secs: login_timeout_seconds as u64,
        }
    }
}

impl From<PolicyConfig> for RawPolicy {
    fn from(policy: PolicyConfig) -> Self {
        Self {
            min_password_length: Some(policy.min_password_length as i64),
            max_login_attempts: Some(policy.max_login_attempts as i64),
            login_timeout_seconds: Some(policy.login_timeout_secs.min(i64::MAX as u64) as i64),
        }
    }
}

fn clamp_field(field: &str, raw: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    let Some(value) = raw else {
        return default;
    };
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(field, value, clamped, "policy value out of range, clamping");
    }
    clamped
}

// ---------------------------------------------------------------------------
// CommandAccess
// ---------------------------------------------------------------------------

/// Default answers for the allow-list administration commands when no
/// permission authority decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandAccess {
    /// Anyone may run `allowlist add`.
    pub allow_add_for_everyone: bool,
    /// Anyone may run `allowlist remove`.
    pub allow_remove_for_everyone: bool,
}

impl Default for CommandAccess {
    fn default() -> Self {
        Self {
            allow_add_for_everyone: true,
            allow_remove_for_everyone: false,
        }
    }
}
