//! Room-to-room distance fields and shortest-path reconstruction.
//!
//! Rooms are connected through the junction cell between them, so one hop
//! always spans two grid units. The expansion picks the lowest unclosed room
//! by a plain linear scan; mazes are small enough that a heap buys nothing.

use tracing::trace;

use crate::{
    Position,
    map::{CellKind, Grid},
};

/// Neighbor order used both for relaxation and for walking a path back.
/// Ties in the distance field are broken by this order, so it must stay fixed.
const STEP_PRIORITY: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("({}, {}) is not a room cell of the maze", position.x, position.y)]
    NotARoom { position: Position },
    #[error("no path from ({}, {}) to ({}, {})", start.x, start.y, goal.x, goal.y)]
    PathNotFound { start: Position, goal: Position },
}

/// Hop counts from a single anchor room to every room it can reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceField {
    anchor: Position,
    distances: Grid<Option<u32>>,
    closed: Grid<bool>,
}

impl DistanceField {
    pub fn anchor(&self) -> Position {
        self.anchor
    }

    /// Junction hops from the anchor, `None` when unreachable or not a room.
    pub fn distance(&self, position: Position) -> Option<u32> {
        self.distances.get(position.x, position.y).copied().flatten()
    }

    /// Whether the expansion settled this cell.
    pub fn is_closed(&self, position: Position) -> bool {
        self.closed
            .get(position.x, position.y)
            .copied()
            .unwrap_or(false)
    }

    /// Rooms of `grid` that the anchor cannot reach.
    pub fn unreachable_rooms<'a>(
        &'a self,
        grid: &'a Grid<CellKind>,
    ) -> impl Iterator<Item = Position> + 'a {
        grid.rooms()
            .filter(move |&room| !self.is_closed(room))
    }

    fn lowest_open(&self, grid: &Grid<CellKind>) -> Option<Position> {
        grid.rooms()
            .filter(|&room| !self.is_closed(room))
            .filter_map(|room| self.distances[room].map(|d| (room, d)))
            .min_by_key(|&(_, d)| d)
            .map(|(room, _)| room)
    }
}

/// Room reached by leaving `from` through the junction at `(dx, dy)`, if that junction is open.
fn hop(grid: &Grid<CellKind>, from: Position, dx: isize, dy: isize) -> Option<Position> {
    if grid.cell_kind_offset(from, dx, dy).is_wall() {
        return None;
    }
    from.offset(dx * 2, dy * 2)
        .filter(|next| grid.is_valid(next.x, next.y))
}

/// Floods the maze outward from `anchor`, recording the hop count to every reachable room.
pub fn compute_distances(
    grid: &Grid<CellKind>,
    anchor: Position,
) -> Result<DistanceField, PathError> {
    if !grid.is_room(anchor) {
        return Err(PathError::NotARoom { position: anchor });
    }

    let mut field = DistanceField {
        anchor,
        distances: Grid::new(grid.width(), grid.height()),
        closed: Grid::new(grid.width(), grid.height()),
    };
    field.distances[anchor] = Some(0);

    while let Some(current) = field.lowest_open(grid) {
        field.closed[current] = true;
        let Some(distance) = field.distances[current] else {
            continue;
        };

        for (dx, dy) in STEP_PRIORITY {
            let Some(next) = hop(grid, current, dx, dy) else {
                continue;
            };
            let candidate = distance + 1;
            if field.distances[next].is_none_or(|known| candidate < known) {
                field.distances[next] = Some(candidate);
            }
        }
    }

    Ok(field)
}

/// Shortest room path between `start` and `goal`.
///
/// The returned sequence begins at `goal` and ends at `start`, so the element
/// before the last is the first step to take from `start`.
pub fn find_path(
    grid: &Grid<CellKind>,
    start: Position,
    goal: Position,
) -> Result<Vec<Position>, PathError> {
    if !grid.is_room(goal) {
        return Err(PathError::NotARoom { position: goal });
    }
    let field = compute_distances(grid, start)?;
    let not_found = PathError::PathNotFound { start, goal };

    let mut remaining = field.distance(goal).ok_or_else(|| not_found.clone())?;
    let mut current = goal;
    let mut path = Vec::with_capacity(remaining as usize + 1);
    path.push(goal);

    while current != start {
        let next = STEP_PRIORITY
            .iter()
            .filter_map(|&(dx, dy)| hop(grid, current, dx, dy))
            .find(|&next| field.distance(next) == Some(remaining - 1))
            .ok_or_else(|| not_found.clone())?;
        path.push(next);
        current = next;
        remaining -= 1;
    }

    trace!(?start, ?goal, hops = path.len() - 1, "path found");
    Ok(path)
}
