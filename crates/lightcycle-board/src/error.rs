//! Error types for the board layer.

use lightcycle_protocol::{Phase, PlayerId};

/// Why a placement or reposition was refused.
///
/// Every variant leaves the board untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The coordinate lies outside `[0, size)` on either axis.
    #[error("position ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    /// Another player (or trail) already owns the cell.
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: i32, y: i32 },

    /// The player has never been placed on this board.
    #[error("player {0} is not on this board")]
    PlayerUnknown(PlayerId),

    /// The player already holds an index on this board.
    #[error("player {0} is already on this board")]
    DuplicatePlayer(PlayerId),

    /// Placement is only allowed while the board is `Waiting`.
    #[error("board is {0}, placement requires Waiting")]
    InvalidPhase(Phase),
}
