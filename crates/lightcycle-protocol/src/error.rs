//! Error types for the protocol layer.
//!
//! Each crate in Lightcycle defines its own error enum. A `ProtocolError`
//! always means a value coming from outside could not be understood, never
//! that the game itself rejected an action.

/// Errors that can occur while interpreting protocol values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A heading string was not one of `up`, `down`, `left`, `right`.
    ///
    /// Carries the rejected input so the transport can echo it back.
    #[error("invalid direction: {0:?}")]
    InvalidDirection(String),
}
