use serde::{Deserialize, Serialize};

pub mod agent;
pub mod config;
pub mod game;
pub mod generator;
pub mod map;
pub mod pathfinding;

/// Represents a 2D grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns the position shifted by `(dx, dy)`, or `None` if either axis would go negative.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// Room cells sit at odd/odd coordinates.
    #[inline]
    pub fn is_room(self) -> bool {
        self.x % 2 == 1 && self.y % 2 == 1
    }

    /// Moves each even coordinate back by one (never below 1) so the result is a room.
    pub fn to_room(self) -> Position {
        let snap = |v: usize| if v % 2 == 0 { v.saturating_sub(1).max(1) } else { v };
        Position {
            x: snap(self.x),
            y: snap(self.y),
        }
    }
}

/// One of the four cardinal movement directions.
///
/// The y axis grows downwards, so `Up` is a negative y offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit grid offset for this direction.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Maps an axis-aligned delta back to a direction. Only the sign matters,
    /// so room-to-room deltas of 2 convert the same way as unit deltas.
    pub fn from_delta(dx: isize, dy: isize) -> Option<Direction> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }
}

pub use agent::{Agent, Body, BoundingBox, Ghost, Pacman};
pub use config::{ConfigError, Difficulty, GameConfig};
pub use game::{Game, GameState, GhostKind};
pub use generator::{GenerationError, MazeGenerator};
pub use map::{CellKind, Grid};
pub use pathfinding::{DistanceField, PathError, compute_distances, find_path};
