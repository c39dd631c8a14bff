//! Unified error type for Lightcycle.

use std::path::PathBuf;

use lightcycle_board::BoardError;
use lightcycle_protocol::ProtocolError;
use lightcycle_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each layer's variant generates the `From`
/// impl, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LightcycleError {
    /// A client sent something that isn't part of the vocabulary.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A board refused a placement.
    #[error(transparent)]
    Board(#[from] BoardError),

    /// A room or registry operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`GameConfig`](crate::GameConfig).
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightcycle_protocol::{Phase, PlayerId, RoomId};

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidDirection("north".into());
        let err: LightcycleError = err.into();
        assert!(matches!(err, LightcycleError::Protocol(_)));
        assert!(err.to_string().contains("north"));
    }

    #[test]
    fn test_from_board_error() {
        let err: LightcycleError = BoardError::OutOfBounds { x: -1, y: 3 }.into();
        assert!(matches!(err, LightcycleError::Board(_)));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_from_room_error() {
        let err: LightcycleError = RoomError::RoomUnknown(RoomId::random()).into();
        assert!(matches!(err, LightcycleError::Room(_)));
    }

    #[test]
    fn test_room_wrapped_board_error_keeps_message() {
        let player = PlayerId::random();
        let inner = BoardError::DuplicatePlayer(player);
        let err: LightcycleError = RoomError::from(inner.clone()).into();
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn test_invalid_phase_message() {
        let err: LightcycleError = RoomError::InvalidPhase(Phase::Started).into();
        assert!(err.to_string().contains("Started"));
    }
}
