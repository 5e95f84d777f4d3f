//! Fixed-rate heartbeat for hosts that don't have a tick of their own.
//!
//! Game servers usually already run a main loop and can call
//! [`Warden::on_tick`](crate::Warden::on_tick) from it. For those that
//! don't (and for the demo host), [`Heartbeat`] provides a
//! `tokio::time`-based ticker and [`drive`] runs the sweep on it until
//! shutdown.
//!
//! Overruns use the skip policy: if a tick fires late, the missed ticks
//! are dropped and the next one is scheduled from now. Enforcement is
//! idempotent, so there is nothing to catch up on.
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let heartbeat = Heartbeat::new(warden.config().tick_rate_hz);
//! tokio::spawn(heartbeat::drive(Arc::clone(&warden), heartbeat, shutdown_rx));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, error, info, trace, warn};

use crate::{PlayerHost, Warden, WardenConfig};

/// Information about one fired tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired more than 10% of a period late.
    pub overrun: bool,
    /// Ticks dropped because of the overrun.
    pub ticks_skipped: u64,
}

/// A fixed-rate ticker with pause/resume.
#[derive(Debug)]
pub struct Heartbeat {
    tick_duration: Duration,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: TokioInstant,
    paused: bool,
}

impl Heartbeat {
    /// Creates a heartbeat at `tick_rate_hz`, clamped to the supported
    /// range. The first tick fires one period from now.
    pub fn new(tick_rate_hz: u32) -> Self {
        let config = WardenConfig {
            tick_rate_hz,
            ..WardenConfig::default()
        }
        .validated();
        let tick_duration = config.tick_duration();

        debug!(
            rate_hz = config.tick_rate_hz,
            period_ms = tick_duration.as_secs_f64() * 1000.0,
            "heartbeat created"
        );

        Self {
            tick_duration,
            tick_count: 0,
            next_tick: TokioInstant::now() + tick_duration,
            paused: false,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// While paused this future pends forever; inside `tokio::select!`
    /// the other branches keep running.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let next = self.next_tick;
        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > self.tick_duration / 10;
        let mut ticks_skipped = 0u64;
        if overrun {
            ticks_skipped = (late_by.as_nanos() / self.tick_duration.as_nanos()) as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "heartbeat overrun — skipping ahead"
                );
            }
        }
        // Always schedule from now, not from the missed deadline.
        self.next_tick = now + self.tick_duration;

        trace!(tick = self.tick_count, overrun, "heartbeat");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Pauses the heartbeat. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "heartbeat paused");
        }
    }

    /// Resumes after a pause. The next tick fires one period from now,
    /// so time spent paused doesn't produce a burst.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.tick_duration;
            debug!(tick = self.tick_count, "heartbeat resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}

/// Runs the enforcement sweep on every heartbeat until `shutdown` turns
/// `true` (or its sender is dropped), then flushes the store.
pub async fn drive<H: PlayerHost>(
    warden: Arc<Warden<H>>,
    mut heartbeat: Heartbeat,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        period_ms = heartbeat.tick_duration().as_millis() as u64,
        "enforcement heartbeat running"
    );

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = heartbeat.wait_for_tick() => {
                warden.on_tick(TokioInstant::now().into_std());
            }
        }
    }

    if let Err(e) = warden.save() {
        error!(error = %e, "failed to flush store on shutdown");
    }
    info!(ticks = heartbeat.tick_count(), "enforcement heartbeat stopped");
}
