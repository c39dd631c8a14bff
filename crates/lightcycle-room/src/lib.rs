//! Rooms and the room registry for Lightcycle.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster and at most one board. The registry is another actor that owns
//! the room-id → room mapping; nothing else ever touches that map.
//!
//! # Key types
//!
//! - [`Registry`]: creates, looks up and forgets rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomInfo`]: snapshot of a room's roster and phase
//! - [`RoomConfig`] / [`RegistryConfig`]: channel sizes and idle expiry

mod config;
mod error;
mod registry;
mod room;

pub use config::{RegistryConfig, RoomConfig};
pub use error::RoomError;
pub use registry::Registry;
pub use room::{RoomHandle, RoomInfo};
