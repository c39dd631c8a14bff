//! The game loop: ticks, steering and cancellation for a running board.

use lightcycle_protocol::{DirectionUpdate, Update};
use lightcycle_tick::TickScheduler;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::Board;

impl Board {
    /// Runs the match to completion and hands the board back.
    ///
    /// The loop waits on three sources:
    /// - `cancel` resolving (sent *or* dropped) abandons the match;
    /// - a tick moves every player once and emits `Crashed`/`Winner`
    ///   updates on `events`;
    /// - a steering message overwrites a live player's heading. It is
    ///   observed on the next tick.
    ///
    /// Events are sent with `try_send`, so a slow consumer never stalls the
    /// simulation. Size `events` to at least `player_count() + 1`, the most
    /// a match can emit, and nothing is ever dropped.
    ///
    /// Returns immediately if the board is not `Waiting`.
    pub async fn run(
        mut self,
        mut steering: mpsc::Receiver<DirectionUpdate>,
        events: mpsc::Sender<Update>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Self {
        if let Err(e) = self.begin() {
            debug!(error = %e, "board not started");
            return self;
        }

        let mut scheduler = TickScheduler::new(self.config().tick_config());
        info!(
            players = self.player_count(),
            size = self.size(),
            ticks_per_second = scheduler.tick_rate_hz(),
            tick_ms = scheduler.tick_duration().as_secs_f64() * 1000.0,
            "match started"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut cancel => {
                    self.abandon();
                    warn!(tick = scheduler.tick_count(), "match cancelled");
                    break;
                }
                tick = scheduler.wait_for_tick() => {
                    let outcome = self.step();
                    trace!(tick = tick.tick, "board:\n{}", self);

                    for index in outcome.crashed {
                        emit(&events, Update::crashed(index));
                    }
                    if let Some(winner) = outcome.winner {
                        info!(%winner, tick = tick.tick, "match won");
                        emit(&events, Update::winner(winner));
                        break;
                    }
                }
                Some(update) = steering.recv() => {
                    if !self.set_direction(update.player, update.direction) {
                        debug!(player = %update.player, "steering for absent player ignored");
                    }
                }
            }
        }

        self
    }
}

fn emit(events: &mpsc::Sender<Update>, update: Update) {
    match events.try_send(update) {
        Ok(()) => {}
        Err(TrySendError::Full(update)) => {
            warn!(player = %update.player, status = ?update.status, "event channel full, update dropped");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(player = %update.player, "no event listener");
        }
    }
}
