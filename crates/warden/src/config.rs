//! Process-level configuration.
//!
//! Password policy (minimum length, attempts, login timeout) is runtime
//! data that lives in the store file so operators can edit it. This
//! struct covers the rest: where the store lives and how often the
//! heartbeat runs.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Configuration for a [`Warden`](crate::Warden) instance.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    /// Directory holding `warden.json` and its backup.
    pub data_dir: PathBuf,

    /// Heartbeat rate in Hz. Game servers commonly tick at 20.
    pub tick_rate_hz: u32,

    /// Ticks between allow-list audits. At 20 Hz, 1200 is one minute.
    pub audit_interval_ticks: u64,

    /// Minimum gap between two "please log in" reminders to the same
    /// player.
    pub reminder_interval: Duration,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("config"),
            tick_rate_hz: 20,
            audit_interval_ticks: 20 * 60,
            reminder_interval: Duration::from_secs(5),
        }
    }
}

impl WardenConfig {
    /// Maximum supported heartbeat rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - `tick_rate_hz` clamped to `1..=MAX_TICK_RATE_HZ`. Unlike a room
    ///   scheduler there is no event-driven mode: the sweep must run.
    /// - `audit_interval_ticks` at least 1.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz == 0 {
            warn!("tick_rate_hz is 0, the enforcement sweep needs a heartbeat — using 1");
            self.tick_rate_hz = 1;
        } else if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum — clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        if self.audit_interval_ticks == 0 {
            warn!("audit_interval_ticks is 0 — auditing every tick");
            self.audit_interval_ticks = 1;
        }
        self
    }

    /// Duration of a single heartbeat tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audits_once_a_minute() {
        let cfg = WardenConfig::default();
        let minute = cfg.tick_duration() * cfg.audit_interval_ticks as u32;
        assert_eq!(minute, Duration::from_secs(60));
    }

    #[test]
    fn test_validated_zero_rate_becomes_one() {
        let cfg = WardenConfig {
            tick_rate_hz: 0,
            ..WardenConfig::default()
        }
        .validated();
        assert_eq!(cfg.tick_rate_hz, 1);
        assert_eq!(cfg.tick_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_validated_caps_rate() {
        let cfg = WardenConfig {
            tick_rate_hz: 1000,
            ..WardenConfig::default()
        }
        .validated();
        assert_eq!(cfg.tick_rate_hz, WardenConfig::MAX_TICK_RATE_HZ);
    }

    #[test]
    fn test_validated_zero_audit_interval_becomes_one() {
        let cfg = WardenConfig {
            audit_interval_ticks: 0,
            ..WardenConfig::default()
        }
        .validated();
        assert_eq!(cfg.audit_interval_ticks, 1);
    }
}
