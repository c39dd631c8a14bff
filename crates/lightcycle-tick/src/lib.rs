//! Fixed-timestep tick scheduler for Lightcycle.
//!
//! Drives a board's game loop at a configurable rate (1–128 Hz). A match
//! always has a clock, so unlike a turn-based scheduler there is no
//! event-driven mode: the rate is clamped to at least 1 Hz.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside the board's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(update) = steering.recv() => { /* apply heading */ }
//!         _ = scheduler.wait_for_tick() => {
//!             let outcome = board.step();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the loop wakes up later than the scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the original cadence. The next tick fires at its scheduled
    /// time even if that is already in the past.
    Drop,
}

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz, clamped to `MIN_TICK_RATE_HZ..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Random jitter (0–max µs) added to the *first* tick so matches
    /// started in the same instant don't tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Self::MIN_TICK_RATE_HZ,
            policy: TickPolicy::default(),
            initial_jitter_us: 0,
        }
    }
}

impl TickConfig {
    /// Slowest supported tick rate.
    pub const MIN_TICK_RATE_HZ: u32 = 1;
    /// Fastest supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Create a config for a specific tick rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamp `tick_rate_hz` into the supported range.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        let clamped = self
            .tick_rate_hz
            .clamp(Self::MIN_TICK_RATE_HZ, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped,
                "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self
    }

    /// Duration of a single tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(Self::MIN_TICK_RATE_HZ)
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired more than 10% late.
    pub overrun: bool,
    /// Whole ticks that were skipped because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep tick scheduler. One per running board.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    /// When the next tick should fire.
    next_tick: Instant,
}

impl TickScheduler {
    /// Create a new scheduler from config. The first tick is due one tick
    /// duration (plus jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.tick_rate_hz,
            tick_ms = tick_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            next_tick: Instant::now() + tick_duration + jitter,
            config,
            tick_duration,
            tick_count: 0,
        }
    }

    /// Wait until the next tick is due.
    ///
    /// Cancel-safe: if the future is dropped before it resolves (another
    /// `select!` branch won), the pending tick stays scheduled.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let scheduled = self.next_tick;
        time::sleep_until(scheduled).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(scheduled);
        let overrun = late_by > self.tick_duration / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped =
                        (late_by.as_nanos() / self.tick_duration.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                now + self.tick_duration
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, keeping original cadence"
                    );
                }
                scheduled + self.tick_duration
            }
        };

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured (clamped) tick rate in Hz.
    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    /// The fixed duration between ticks.
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
