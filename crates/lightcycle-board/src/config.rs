//! Board configuration.

use std::time::Duration;

use lightcycle_tick::{TickConfig, TickPolicy};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Size and speed of a board.
///
/// Values outside the supported range are clamped by [`validated`](Self::validated)
/// rather than rejected, so a careless client can't break a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Width and height of the square grid, `MIN_SIZE..=MAX_SIZE`.
    pub size: usize,
    /// Simulation steps per second.
    pub ticks_per_second: u32,
    /// How the game loop catches up after a late tick.
    pub tick_policy: TickPolicy,
    /// Up to this many microseconds of random delay before the first tick,
    /// so matches started together don't tick in lockstep.
    pub tick_jitter_us: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            size: 50,
            ticks_per_second: 10,
            tick_policy: TickPolicy::Skip,
            tick_jitter_us: 0,
        }
    }
}

impl BoardConfig {
    /// Smallest board side length.
    pub const MIN_SIZE: usize = 10;
    /// Largest board side length. Keeps the grid allocation bounded and
    /// every coordinate within `i32`.
    pub const MAX_SIZE: usize = 1024;

    pub fn new(size: usize, ticks_per_second: u32) -> Self {
        Self {
            size,
            ticks_per_second,
            ..Self::default()
        }
    }

    /// Clamp `size` into `MIN_SIZE..=MAX_SIZE` and `ticks_per_second`
    /// into the scheduler's supported range.
    pub fn validated(mut self) -> Self {
        let size = self.size.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
        if size != self.size {
            warn!(
                size = self.size,
                min = Self::MIN_SIZE,
                max = Self::MAX_SIZE,
                "board size out of range, clamping"
            );
            self.size = size;
        }
        let speed = self
            .ticks_per_second
            .clamp(TickConfig::MIN_TICK_RATE_HZ, TickConfig::MAX_TICK_RATE_HZ);
        if speed != self.ticks_per_second {
            warn!(
                ticks_per_second = self.ticks_per_second,
                clamped = speed,
                "board speed out of range, clamping"
            );
            self.ticks_per_second = speed;
        }
        self
    }

    /// Longest a match can possibly last: every cell visited once, i.e.
    /// `size² / ticks_per_second` seconds.
    ///
    /// Computed from the fields as they are. A board always holds a
    /// validated config, so for a running match the speed is the clamped
    /// one (at most 128): asking for 1000 tps yields the life of a 128 tps
    /// match, matching how fast the loop really ticks.
    pub fn life(&self) -> Duration {
        let side = self.size as u64;
        Duration::from_secs(side.saturating_mul(side)) / self.ticks_per_second.max(1)
    }

    /// Scheduler settings for a game loop running this board.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            policy: self.tick_policy,
            initial_jitter_us: self.tick_jitter_us,
            ..TickConfig::with_rate(self.ticks_per_second)
        }
    }
}
