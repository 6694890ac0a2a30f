//! Random maze synthesis.
//!
//! Candidates are drawn from a fixed template (rooms at odd/odd cells, coin
//! flips on the corridors between them), patched so every room has at least
//! two exits, filled with pickups and then checked for global connectivity.
//! Disconnected candidates are thrown away whole and redrawn.

use rand::Rng;
use tracing::{debug, info};

use crate::{
    Direction, Position,
    config::check_dimensions,
    map::{CellKind, Grid},
    pathfinding::compute_distances,
};

pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Every room is checked for reachability from this one.
pub const REFERENCE_ROOM: Position = Position::new(1, 1);

/// Minimum number of open corridors each room gets during the repair pass.
const MIN_ROOM_EXITS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("maze dimensions must be odd and at least 3x3, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("no fully connected maze found after {attempts} attempts")]
    AttemptsExhausted { attempts: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeGenerator {
    max_attempts: usize,
}

impl Default for MazeGenerator {
    fn default() -> Self {
        MazeGenerator::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl MazeGenerator {
    pub fn new(max_attempts: usize) -> Self {
        MazeGenerator { max_attempts }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Draws candidate mazes until one connects every room to [`REFERENCE_ROOM`].
    ///
    /// The returned grid has a solid outer ring and a pickup on every room.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Result<Grid<CellKind>, GenerationError> {
        check_dimensions(width, height)?;

        for attempt in 1..=self.max_attempts {
            let mut grid = stochastic_fill(width, height, rng);
            grid.fill_border(CellKind::Wall);
            open_dead_ends(&mut grid, rng);
            // The repair pass may have opened a border junction.
            grid.fill_border(CellKind::Wall);
            seed_pickups(&mut grid);

            let unreachable = unreachable_room_count(&grid);
            if unreachable == 0 {
                info!(width, height, attempt, "maze accepted");
                return Ok(grid);
            }
            debug!(attempt, unreachable, "discarding disconnected maze");
        }

        Err(GenerationError::AttemptsExhausted {
            attempts: self.max_attempts,
        })
    }
}

fn stochastic_fill<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Grid<CellKind> {
    Grid::from_generator(width, height, |x, y| match (x % 2 == 1, y % 2 == 1) {
        (true, true) => CellKind::Open,
        // Corridor between two horizontally or vertically adjacent rooms.
        (true, false) | (false, true) => {
            if rng.random_bool(0.5) {
                CellKind::Open
            } else {
                CellKind::Wall
            }
        }
        (false, false) => CellKind::Wall,
    })
}

/// Opens random walled corridors around each room until it has [`MIN_ROOM_EXITS`].
fn open_dead_ends<R: Rng + ?Sized>(grid: &mut Grid<CellKind>, rng: &mut R) {
    let rooms: Vec<Position> = grid.rooms().collect();
    for room in rooms {
        let mut walled: Vec<Position> = Vec::with_capacity(4);
        let mut exits = 0;
        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            let Some(junction) = room.offset(dx, dy) else {
                continue;
            };
            match grid.get(junction.x, junction.y) {
                Some(CellKind::Wall) => walled.push(junction),
                Some(_) => exits += 1,
                None => {}
            }
        }

        while exits < MIN_ROOM_EXITS && !walled.is_empty() {
            let junction = walled.swap_remove(rng.random_range(0..walled.len()));
            grid[junction] = CellKind::Open;
            exits += 1;
        }
    }
}

fn seed_pickups(grid: &mut Grid<CellKind>) {
    let rooms: Vec<Position> = grid.rooms().collect();
    for room in rooms {
        if !grid[room].is_wall() {
            grid[room] = CellKind::Pickup;
        }
    }
}

fn unreachable_room_count(grid: &Grid<CellKind>) -> usize {
    match compute_distances(grid, REFERENCE_ROOM) {
        Ok(field) => field.unreachable_rooms(grid).count(),
        Err(_) => grid.rooms().count(),
    }
}
