//! Core value types shared by the board, room and registry layers.
//!
//! Everything here is a plain value: cheap to clone, comparable, and
//! serializable so a transport can forward it to browser clients as-is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected user.
///
/// Newtype over a random UUID so it can't be confused with a [`RoomId`].
/// `#[serde(transparent)]` keeps the wire form a plain UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generates a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one match container).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Generates a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A connected user: an id plus the display name they chose.
///
/// Created once per connection and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    /// Creates a player with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::random(),
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Board vocabulary
// ---------------------------------------------------------------------------

/// A player's slot on a board.
///
/// Indices are handed out densely from 1 in join order. The grid stores
/// them directly, with 0 reserved for an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerIndex(pub u32);

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A grid coordinate. `x` grows rightwards, `y` grows downwards.
///
/// Signed on purpose: a crashing move can leave a player one step
/// outside the board before it is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step along `direction`.
    pub fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::new(self.x, self.y - 1),
            Direction::Down => Self::new(self.x, self.y + 1),
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A player's heading.
///
/// Serialized lowercase (`"up"`, `"left"`, ...) to match what browser
/// clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Right => "right",
            Self::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "right" => Ok(Self::Right),
            "left" => Ok(Self::Left),
            _ => Err(ProtocolError::InvalidDirection(s.to_string())),
        }
    }
}

/// Lifecycle phase shared by boards and rooms.
///
/// ```text
/// Waiting → Started → Ended
/// ```
///
/// A board never leaves `Ended`. A room may go back to `Waiting` when a
/// fresh board is installed after a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    Started,
    Ended,
}

impl Phase {
    /// Returns `true` if `target` directly follows this phase:
    /// `Waiting → Started → Ended`.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Started) | (Self::Started, Self::Ended)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Started => write!(f, "Started"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// What happened to a player within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Crashed,
    Winner,
}

/// Inbound steering message: "player N now heads this way".
///
/// Applied by the game loop immediately, observed on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionUpdate {
    pub player: PlayerIndex,
    pub direction: Direction,
}

/// Outbound match event: a player crashed or won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub player: PlayerIndex,
    pub status: PlayerStatus,
}

impl Update {
    pub fn crashed(player: PlayerIndex) -> Self {
        Self {
            player,
            status: PlayerStatus::Crashed,
        }
    }

    pub fn winner(player: PlayerIndex) -> Self {
        Self {
            player,
            status: PlayerStatus::Winner,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.status == PlayerStatus::Winner
    }
}

// =========================================================================
// Tests
// =========================================================================
