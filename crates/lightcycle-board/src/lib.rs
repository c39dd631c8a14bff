//! The arena for one Lightcycle match.
//!
//! A [`Board`] is an N×N grid on which every player leaves a permanent
//! trail. Before the match, players are placed on it; once [`Board::run`]
//! is called the board moves into its own task and becomes the sole
//! mutator of the grid until one (or zero) players remain.
//!
//! # Key types
//!
//! - [`Board`]: grid, placement rules, movement, and the game loop
//! - [`BoardConfig`]: size and speed, clamped to sane minimums
//! - [`BoardSnapshot`]: serializable pre-match view for transports
//! - [`TickOutcome`]: what a single simulation step produced
//! - [`BoardError`]: why a placement was refused

mod board;
mod config;
mod error;
mod game_loop;

pub use board::{infer_direction, Board, BoardSnapshot, PlacedPlayer, TickOutcome};
pub use config::BoardConfig;
pub use error::BoardError;
pub use lightcycle_tick::TickPolicy;
