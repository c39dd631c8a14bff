//! Plays one two-player match in-process and logs what happens.
//!
//! Usage: `duel [config.toml]`. Run with `RUST_LOG=debug` to see every
//! placement and crash, or `RUST_LOG=lightcycle_board=trace` for the grid.

use lightcycle::prelude::*;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<(), LightcycleError> {
    lightcycle::telemetry::init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let registry = config.spawn_registry();
    let far = config.board.size as i32 - 1;

    let ana = Player::new("ana");
    let bo = Player::new("bo");
    let room = registry.create_room(ana.clone()).await?;
    room.join(bo.clone()).await?;
    room.set_board(config.board).await?;

    let a = room.participate(ana.id, 0, 0, "red").await?;
    let b = room.participate(bo.id, far, far, "blue").await?;
    tracing::info!(room_id = %room.room_id(), %a, %b, "players placed");

    let mut updates = room.subscribe();
    room.start_game().await?;

    // ana swerves right so the cycles meet in the top-right corner.
    room.steer(DirectionUpdate {
        player: a,
        direction: Direction::Right,
    })
    .await?;

    loop {
        match updates.recv().await {
            Ok(update) if update.is_winner() => {
                tracing::info!(winner = %update.player, "match over");
                break;
            }
            Ok(update) => tracing::info!(player = %update.player, status = ?update.status, "update"),
            Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "missed updates"),
            Err(RecvError::Closed) => break,
        }
    }

    let info = room.info().await?;
    tracing::info!(phase = %info.phase, players = info.players.len(), "final room state");
    registry.shutdown().await?;
    Ok(())
}
