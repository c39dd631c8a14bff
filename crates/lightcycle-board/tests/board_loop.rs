//! Integration tests for the board's game loop.
//!
//! All tests run on a paused clock, so a 10-tick match at 2 Hz takes no
//! real time.

use std::time::Duration;

use lightcycle_board::{Board, BoardConfig, TickPolicy};
use lightcycle_protocol::{
    Direction, DirectionUpdate, Phase, PlayerId, PlayerIndex, PlayerStatus, Update,
};
use tokio::sync::{mpsc, oneshot};

// =========================================================================
// Helpers
// =========================================================================

/// Board 10×10 at 2 Hz with players at opposite corners:
/// #1 at (0,0) heading down, #2 at (9,9) heading up.
fn duel() -> Board {
    let mut board = Board::new(BoardConfig::new(10, 2));
    board.add(PlayerId::random(), 0, 0, "red").unwrap();
    board.add(PlayerId::random(), 9, 9, "blue").unwrap();
    board
}

struct Wiring {
    steer_tx: mpsc::Sender<DirectionUpdate>,
    events_rx: mpsc::Receiver<Update>,
    cancel_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<Board>,
}

fn spawn(board: Board) -> Wiring {
    let (steer_tx, steer_rx) = mpsc::channel(8);
    let (events_tx, events_rx) = mpsc::channel(board.player_count() + 1);
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(board.run(steer_rx, events_tx, cancel_rx));
    Wiring {
        steer_tx,
        events_rx,
        cancel_tx,
        task,
    }
}

async fn drain(rx: &mut mpsc::Receiver<Update>) -> Vec<Update> {
    let mut out = Vec::new();
    while let Some(update) = rx.recv().await {
        out.push(update);
    }
    out
}

// =========================================================================
// Full matches
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_steered_duel_produces_one_crash_and_one_winner() {
    let mut w = spawn(duel());
    w.steer_tx
        .send(DirectionUpdate {
            player: PlayerIndex(1),
            direction: Direction::Right,
        })
        .await
        .unwrap();

    let events = drain(&mut w.events_rx).await;
    let board = w.task.await.unwrap();

    assert_eq!(
        events,
        vec![
            Update::crashed(PlayerIndex(2)),
            Update::winner(PlayerIndex(1)),
        ]
    );
    assert_eq!(board.phase(), Phase::Ended);
    assert_eq!(board.players().collect::<Vec<_>>(), vec![PlayerIndex(1)]);
    drop(w.cancel_tx);
}

#[tokio::test(start_paused = true)]
async fn test_mutual_crash_credits_last_crasher() {
    let start = tokio::time::Instant::now();
    let mut w = spawn(duel());

    let events = drain(&mut w.events_rx).await;
    let board = w.task.await.unwrap();

    let crashed: Vec<_> = events
        .iter()
        .filter(|u| u.status == PlayerStatus::Crashed)
        .map(|u| u.player)
        .collect();
    assert_eq!(crashed, vec![PlayerIndex(1), PlayerIndex(2)]);
    assert_eq!(events.last(), Some(&Update::winner(PlayerIndex(2))));
    assert_eq!(board.player_count(), 0);
    // Ten ticks at 2 Hz.
    assert!(start.elapsed() >= Duration::from_secs(5));
    drop(w.cancel_tx);
}

#[tokio::test(start_paused = true)]
async fn test_steering_for_unknown_player_is_ignored() {
    let mut w = spawn(duel());
    w.steer_tx
        .send(DirectionUpdate {
            player: PlayerIndex(9),
            direction: Direction::Left,
        })
        .await
        .unwrap();

    let events = drain(&mut w.events_rx).await;
    assert_eq!(events.len(), 3);
    assert!(events[2].is_winner());
    w.task.await.unwrap();
    drop(w.cancel_tx);
}

#[tokio::test(start_paused = true)]
async fn test_tick_settings_from_config_drive_the_loop() {
    let start = tokio::time::Instant::now();
    let mut board = Board::new(BoardConfig {
        tick_policy: TickPolicy::Drop,
        tick_jitter_us: 100_000,
        ..BoardConfig::new(10, 2)
    });
    board.add(PlayerId::random(), 0, 0, "red").unwrap();
    board.add(PlayerId::random(), 9, 9, "blue").unwrap();
    let mut w = spawn(board);

    let events = drain(&mut w.events_rx).await;
    w.task.await.unwrap();

    assert_eq!(events.last(), Some(&Update::winner(PlayerIndex(2))));
    // Ten ticks at 2 Hz, shifted by at most the first-tick jitter.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed <= Duration::from_millis(5_110));
    drop(w.cancel_tx);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_the_loop_and_ends_the_board() {
    let mut w = spawn(duel());

    tokio::time::sleep(Duration::from_millis(1200)).await;
    w.cancel_tx.send(()).unwrap();

    let board = w.task.await.unwrap();
    assert_eq!(board.phase(), Phase::Ended);
    // Two ticks happened, nobody crashed, nobody won.
    assert_eq!(board.player_count(), 2);
    assert_eq!(board.cell(0, 2), Some(1));
    assert!(drain(&mut w.events_rx).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_cancel_sender_also_stops_the_loop() {
    let w = spawn(duel());
    drop(w.cancel_tx);

    let board = w.task.await.unwrap();
    assert_eq!(board.phase(), Phase::Ended);
    assert_eq!(board.cell(0, 1), Some(0));
}

// =========================================================================
// Phase guard
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_on_started_board_returns_immediately() {
    let mut board = duel();
    board.begin().unwrap();

    let mut w = spawn(board);
    let board = w.task.await.unwrap();
    assert_eq!(board.phase(), Phase::Started);
    assert!(drain(&mut w.events_rx).await.is_empty());
    drop(w.cancel_tx);
}
