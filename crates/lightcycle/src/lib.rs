//! # Lightcycle
//!
//! Authoritative simulation core for a real-time light-cycle game.
//!
//! A [`Registry`](lightcycle_room::Registry) creates rooms. Players join a
//! room, get placed on its board, and the room runs the match: every tick
//! each cycle moves one cell, crashes are detected, and a winner is
//! announced to subscribers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lightcycle::prelude::*;
//!
//! # async fn demo() -> Result<(), LightcycleError> {
//! let config = GameConfig::default();
//! let registry = config.spawn_registry();
//!
//! let ana = Player::new("ana");
//! let bo = Player::new("bo");
//! let room = registry.create_room(ana.clone()).await?;
//! room.join(bo.clone()).await?;
//! room.set_board(config.board).await?;
//! room.participate(ana.id, 0, 0, "red").await?;
//! room.participate(bo.id, 49, 49, "blue").await?;
//!
//! let mut updates = room.subscribe();
//! room.start_game().await?;
//! while let Ok(update) = updates.recv().await {
//!     if update.is_winner() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod telemetry;

pub use config::GameConfig;
pub use error::LightcycleError;

pub use lightcycle_board as board;
pub use lightcycle_protocol as protocol;
pub use lightcycle_room as room;
pub use lightcycle_tick as tick;

/// Everything needed to run rooms and matches.
pub mod prelude {
    pub use crate::{GameConfig, LightcycleError};

    pub use lightcycle_board::{Board, BoardConfig, BoardError, BoardSnapshot, TickPolicy};
    pub use lightcycle_protocol::{
        Direction, DirectionUpdate, Phase, Player, PlayerId, PlayerIndex, PlayerStatus,
        Position, ProtocolError, RoomId, Update,
    };
    pub use lightcycle_room::{
        Registry, RegistryConfig, RoomConfig, RoomError, RoomHandle, RoomInfo,
    };
}
