//! Error types for the room layer.

use lightcycle_board::BoardError;
use lightcycle_protocol::{Phase, RoomId};

/// Errors that can occur during room and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this id is registered.
    #[error("room {0} not found")]
    RoomUnknown(RoomId),

    /// The room's phase doesn't allow this operation, e.g. placing a
    /// player after the match started.
    #[error("room is {0}, operation not allowed")]
    InvalidPhase(Phase),

    /// The room has no board yet; call `set_board` first.
    #[error("room {0} has no board")]
    NoBoard(RoomId),

    /// Nobody has been placed on the board.
    #[error("room {0} has no participants")]
    NotEnoughPlayers(RoomId),

    /// The board refused a placement.
    #[error(transparent)]
    Board(#[from] BoardError),

    /// The room's command channel is closed (the actor stopped).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The registry actor has shut down.
    #[error("room registry is closed")]
    RegistryClosed,
}
