//! Shared vocabulary for Lightcycle.
//!
//! This crate defines the values every other layer speaks in:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`Player`]): who is playing
//!   and in which room.
//! - **Board vocabulary** ([`PlayerIndex`], [`Position`], [`Direction`],
//!   [`Phase`]): how the grid refers to players and their motion.
//! - **Messages** ([`DirectionUpdate`], [`Update`], [`PlayerStatus`]):
//!   what flows into a running match and what comes back out.
//! - **Errors** ([`ProtocolError`]): what can go wrong when a transport
//!   turns client strings into these values.
//!
//! # Architecture
//!
//! The protocol layer sits underneath everything else. It knows nothing
//! about channels, tasks or grids; it only names things.
//!
//! ```text
//! Transport → Registry → Room → Board
//!      \________ all speak lightcycle-protocol ________/
//! ```

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    Direction, DirectionUpdate, Phase, Player, PlayerId, PlayerIndex, PlayerStatus, Position,
    RoomId, Update,
};
