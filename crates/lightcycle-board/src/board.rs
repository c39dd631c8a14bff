//! The grid, placement rules and per-tick movement.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use lightcycle_protocol::{Direction, Phase, PlayerId, PlayerIndex, Position};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BoardConfig, BoardError};

/// Grid value for a cell nobody has visited.
const EMPTY: u32 = 0;

/// Picks the starting heading for a player placed at `at`.
///
/// The player faces along the axis with the longest run to an edge, so
/// it survives as long as possible without input. Ties go to the vertical
/// axis; within an axis, ties go to `Up`/`Left`.
pub fn infer_direction(size: usize, at: Position) -> Direction {
    let size = i32::try_from(size).unwrap_or(i32::MAX);
    let (y1, y2) = (at.y, size - at.y);
    let (x1, x2) = (at.x, size - at.x);
    let (max_y, up) = (y1.max(y2), y1 >= y2);
    let (max_x, left) = (x1.max(x2), x1 >= x2);

    if max_x > max_y {
        if left { Direction::Left } else { Direction::Right }
    } else if up {
        Direction::Up
    } else {
        Direction::Down
    }
}

/// What one simulation step produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Players that crashed this tick, in ascending index order.
    pub crashed: Vec<PlayerIndex>,
    /// Set when this tick decided the match.
    pub winner: Option<PlayerIndex>,
}

/// One placed player as seen in a [`BoardSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPlayer {
    pub player: PlayerId,
    pub index: PlayerIndex,
    pub color: String,
    pub position: Position,
    pub direction: Direction,
}

/// Serializable view of a board, taken before a match to draw the
/// starting layout on clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub size: usize,
    pub ticks_per_second: u32,
    pub phase: Phase,
    /// Sorted by index.
    pub players: Vec<PlacedPlayer>,
}

/// The arena for one match.
///
/// Placement methods take `&mut self`: callers serialize them (the room
/// actor does). Once [`run`](Self::run) takes the board by value, the game
/// loop is its only mutator.
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    /// Row-major `size × size` grid of player indices.
    grid: Vec<u32>,
    indices: HashMap<PlayerId, PlayerIndex>,
    colors: BTreeMap<PlayerIndex, String>,
    positions: BTreeMap<PlayerIndex, Position>,
    directions: BTreeMap<PlayerIndex, Direction>,
    phase: Phase,
    next_index: u32,
}

impl Board {
    /// Creates an empty board. The config is clamped first.
    pub fn new(config: BoardConfig) -> Self {
        let config = config.validated();
        Self {
            grid: vec![EMPTY; config.size * config.size],
            config,
            indices: HashMap::new(),
            colors: BTreeMap::new(),
            positions: BTreeMap::new(),
            directions: BTreeMap::new(),
            phase: Phase::Waiting,
            next_index: 1,
        }
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.config.ticks_per_second
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Upper bound on match duration, used as the room's watchdog.
    pub fn life(&self) -> Duration {
        self.config.life()
    }

    pub fn player_index(&self, player: &PlayerId) -> Option<PlayerIndex> {
        self.indices.get(player).copied()
    }

    pub fn color(&self, index: PlayerIndex) -> Option<&str> {
        self.colors.get(&index).map(String::as_str)
    }

    pub fn position(&self, index: PlayerIndex) -> Option<Position> {
        self.positions.get(&index).copied()
    }

    pub fn direction(&self, index: PlayerIndex) -> Option<Direction> {
        self.directions.get(&index).copied()
    }

    /// Number of players still on the board.
    pub fn player_count(&self) -> usize {
        self.indices.len()
    }

    /// Indices of players still on the board, ascending.
    pub fn players(&self) -> impl Iterator<Item = PlayerIndex> + '_ {
        self.positions.keys().copied()
    }

    /// Owner of a cell (0 = empty), or `None` outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> Option<u32> {
        self.offset(Position::new(x, y)).map(|i| self.grid[i])
    }

    fn offset(&self, at: Position) -> Option<usize> {
        let size = self.config.size as i32;
        if at.x < 0 || at.x >= size || at.y < 0 || at.y >= size {
            return None;
        }
        Some(at.y as usize * self.config.size + at.x as usize)
    }

    fn ensure_waiting(&self) -> Result<(), BoardError> {
        if self.phase != Phase::Waiting {
            return Err(BoardError::InvalidPhase(self.phase));
        }
        Ok(())
    }

    /// Places a new player at `(x, y)` and gives it the next index.
    pub fn add(
        &mut self,
        player: PlayerId,
        x: i32,
        y: i32,
        color: impl Into<String>,
    ) -> Result<PlayerIndex, BoardError> {
        self.ensure_waiting()?;
        let at = Position::new(x, y);
        let offset = self.offset(at).ok_or(BoardError::OutOfBounds { x, y })?;
        if self.indices.contains_key(&player) {
            return Err(BoardError::DuplicatePlayer(player));
        }
        if self.grid[offset] != EMPTY {
            return Err(BoardError::CellOccupied { x, y });
        }

        let index = PlayerIndex(self.next_index);
        self.next_index += 1;
        self.grid[offset] = index.0;
        self.indices.insert(player, index);
        self.colors.insert(index, color.into());
        self.positions.insert(index, at);
        let direction = infer_direction(self.config.size, at);
        self.directions.insert(index, direction);

        debug!(%player, %index, position = %at, %direction, "player placed");
        Ok(index)
    }

    /// Moves an already placed player to a new starting cell.
    pub fn update_position(&mut self, player: PlayerId, x: i32, y: i32) -> Result<(), BoardError> {
        self.ensure_waiting()?;
        let at = Position::new(x, y);
        let offset = self.offset(at).ok_or(BoardError::OutOfBounds { x, y })?;
        let index = self
            .player_index(&player)
            .ok_or(BoardError::PlayerUnknown(player))?;
        if self.grid[offset] != EMPTY {
            return Err(BoardError::CellOccupied { x, y });
        }

        if let Some(previous) = self.positions.get(&index).and_then(|p| self.offset(*p)) {
            self.grid[previous] = EMPTY;
        }
        self.grid[offset] = index.0;
        self.positions.insert(index, at);
        let direction = infer_direction(self.config.size, at);
        self.directions.insert(index, direction);

        debug!(%player, %index, position = %at, %direction, "player repositioned");
        Ok(())
    }

    /// Overwrites a player's heading. Returns `false` if the index is no
    /// longer on the board.
    pub fn set_direction(&mut self, index: PlayerIndex, direction: Direction) -> bool {
        match self.directions.get_mut(&index) {
            Some(current) => {
                *current = direction;
                true
            }
            None => false,
        }
    }

    /// Advances one player a single cell along its heading.
    ///
    /// The new coordinate is recorded before it is validated, so after a
    /// crash `position` points at the offending cell until the player is
    /// removed. Returns `false` on a crash.
    pub fn move_player(&mut self, index: PlayerIndex) -> bool {
        let (Some(from), Some(direction)) = (self.position(index), self.direction(index)) else {
            return false;
        };
        let to = from.step(direction);
        self.positions.insert(index, to);

        let Some(offset) = self.offset(to) else {
            return false;
        };
        if self.grid[offset] != EMPTY {
            return false;
        }
        self.grid[offset] = index.0;
        true
    }

    /// Moves the board from `Waiting` to `Started`.
    pub fn begin(&mut self) -> Result<(), BoardError> {
        self.advance(Phase::Started)
    }

    /// Ends a started match without a result. Used when a run is
    /// cancelled. Boards that never started are left alone.
    pub fn abandon(&mut self) {
        let _ = self.advance(Phase::Ended);
    }

    fn advance(&mut self, to: Phase) -> Result<(), BoardError> {
        if !self.phase.can_transition_to(to) {
            return Err(BoardError::InvalidPhase(self.phase));
        }
        self.phase = to;
        Ok(())
    }

    /// Runs one simulation step: every player moves once, in index order.
    ///
    /// Crashed players are removed after the pass. If that leaves one
    /// player, it wins; if it leaves none, the highest-index crasher is
    /// credited. Either way the board moves to `Ended`.
    pub fn step(&mut self) -> TickOutcome {
        if self.phase != Phase::Started {
            return TickOutcome::default();
        }

        let order: Vec<PlayerIndex> = self.players().collect();
        let mut crashed = Vec::new();
        let mut last_standing = None;
        for index in order {
            if self.move_player(index) {
                last_standing = Some(index);
            } else {
                debug!(%index, position = ?self.position(index), "player crashed");
                crashed.push(index);
            }
        }

        if crashed.is_empty() {
            return TickOutcome::default();
        }
        for index in &crashed {
            self.remove(*index);
        }

        let winner = match self.player_count() {
            1 => last_standing,
            0 => crashed.last().copied(),
            _ => None,
        };
        if winner.is_some() {
            let _ = self.advance(Phase::Ended);
        }
        TickOutcome { crashed, winner }
    }

    fn remove(&mut self, index: PlayerIndex) {
        self.indices.retain(|_, i| *i != index);
        self.colors.remove(&index);
        self.positions.remove(&index);
        self.directions.remove(&index);
    }

    /// Serializable view of the current placement.
    pub fn snapshot(&self) -> BoardSnapshot {
        let mut players: Vec<PlacedPlayer> = self
            .indices
            .iter()
            .filter_map(|(player, index)| {
                Some(PlacedPlayer {
                    player: *player,
                    index: *index,
                    color: self.colors.get(index)?.clone(),
                    position: self.position(*index)?,
                    direction: self.direction(*index)?,
                })
            })
            .collect();
        players.sort_by_key(|p| p.index);

        BoardSnapshot {
            size: self.config.size,
            ticks_per_second: self.config.ticks_per_second,
            phase: self.phase,
            players,
        }
    }
}

impl fmt::Display for Board {
    /// ASCII rendering of the grid, one boxed cell per value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.config.size;
        let rule = " ---".repeat(size);
        for row in self.grid.chunks(size) {
            writeln!(f, "{rule}")?;
            for value in row {
                write!(f, "|{value:^3}")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{rule}")
    }
}
