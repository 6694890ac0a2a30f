use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::{
    Direction, Position,
    map::{CellKind, Grid},
    pathfinding::find_path,
};

/// Continuous kinematic state layered over the grid.
///
/// `position` is the top-left corner of the body in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    /// World units per second.
    pub speed: f32,
}

/// Axis-aligned rectangle covered by a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundingBox {
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

impl Body {
    pub fn new(position: Vec2, size: Vec2, speed: f32) -> Self {
        Body {
            position,
            velocity: Vec2::ZERO,
            size,
            speed,
        }
    }

    /// A body exactly covering grid cell `cell`.
    pub fn at_cell(cell: Position, cell_size: f32, speed: f32) -> Self {
        Body::new(
            Vec2::new(cell.x as f32, cell.y as f32) * cell_size,
            Vec2::splat(cell_size),
            speed,
        )
    }

    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            min: self.position,
            max: self.position + self.size,
        }
    }

    /// True when the body is within one tick of travel past a cell corner on both axes.
    pub fn is_at_decision_point(&self, cell_size: f32, tick_rate: f32) -> bool {
        let tolerance = self.speed / tick_rate;
        self.position.x.rem_euclid(cell_size) <= tolerance
            && self.position.y.rem_euclid(cell_size) <= tolerance
    }

    /// Grid cell containing the body's top-left corner.
    pub fn cell(&self, cell_size: f32) -> Position {
        world_to_cell(self.position, cell_size)
    }

    /// Grid cell containing the body's center.
    pub fn center_cell(&self, cell_size: f32) -> Position {
        world_to_cell(self.center(), cell_size)
    }
}

fn world_to_cell(point: Vec2, cell_size: f32) -> Position {
    let cell = (point / cell_size).floor().max(Vec2::ZERO);
    Position::new(cell.x as usize, cell.y as usize)
}

fn axis_sign(value: f32) -> isize {
    if value < 0.0 {
        -1
    } else if value > 0.0 {
        1
    } else {
        0
    }
}

/// Re-evaluates `body`'s velocity when it sits at a decision point.
///
/// The body turns toward `desired` if the neighboring cell that way is not a
/// wall. Otherwise it keeps coasting along its current heading, or stops dead
/// when that is blocked too. `None` means "no input" and stops the body.
/// Returns whether a decision was taken this tick.
pub fn step_velocity(
    body: &mut Body,
    grid: &Grid<CellKind>,
    desired: Option<Direction>,
    cell_size: f32,
    tick_rate: f32,
) -> bool {
    if !body.is_at_decision_point(cell_size, tick_rate) {
        return false;
    }

    let cell = body.cell(cell_size);
    let (dx, dy) = desired.map_or((0, 0), Direction::offset);

    if !grid.cell_kind_offset(cell, dx, dy).is_wall() {
        body.velocity = Vec2::new(dx as f32, dy as f32) * body.speed;
    } else {
        let (cx, cy) = (axis_sign(body.velocity.x), axis_sign(body.velocity.y));
        if grid.cell_kind_offset(cell, cx, cy).is_wall() {
            body.velocity = Vec2::ZERO;
        }
    }
    true
}

/// Common interface of everything that moves through the maze.
pub trait Agent {
    fn body(&self) -> &Body;

    fn body_mut(&mut self) -> &mut Body;

    /// Direction the agent currently wants to travel in.
    fn heading(&self) -> Option<Direction>;

    fn bounding_box(&self) -> BoundingBox {
        self.body().bounding_box()
    }

    /// Integrates velocity over `dt` seconds.
    fn advance(&mut self, dt: f32) {
        self.body_mut().advance(dt);
    }
}

/// The player: steered by input, eats pickups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pacman {
    body: Body,
    direction: Option<Direction>,
    score: u32,
}

impl Pacman {
    pub fn new(body: Body) -> Self {
        Pacman {
            body,
            direction: None,
            score: 0,
        }
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }

    /// Pickups collected so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn step_velocity(&mut self, grid: &Grid<CellKind>, cell_size: f32, tick_rate: f32) {
        step_velocity(&mut self.body, grid, self.direction, cell_size, tick_rate);
    }

    /// Consumes the pickup under the player, if any. Returns whether one was eaten.
    pub fn collect_bits(
        &mut self,
        grid: &mut Grid<CellKind>,
        cell_size: f32,
        tick_rate: f32,
    ) -> bool {
        if !self.body.is_at_decision_point(cell_size, tick_rate) {
            return false;
        }
        let cell = self.body.cell(cell_size);
        let Some(kind) = grid.get_mut(cell.x, cell.y) else {
            return false;
        };
        if *kind != CellKind::Pickup {
            return false;
        }
        *kind = CellKind::Open;
        self.score += 1;
        true
    }
}

impl Agent for Pacman {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn heading(&self) -> Option<Direction> {
        self.direction
    }
}

/// A pursuer that re-plans its route at every room it passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ghost {
    body: Body,
    direction: Option<Direction>,
}

impl Ghost {
    pub fn new(body: Body) -> Self {
        Ghost {
            body,
            direction: None,
        }
    }

    /// Steers toward `target` and updates velocity.
    ///
    /// Junction cells are pass-through: the route is only recomputed while
    /// the ghost's center lies in a room. If no route exists the ghost keeps
    /// its current heading.
    pub fn step_velocity(
        &mut self,
        grid: &Grid<CellKind>,
        target: Position,
        cell_size: f32,
        tick_rate: f32,
    ) {
        let cell = self.body.center_cell(cell_size);
        if grid.is_room(cell) {
            match find_path(grid, cell, target.to_room()) {
                Ok(path) => {
                    // The path runs goal first, so the next room sits just before the end.
                    let next = path[path.len().saturating_sub(2)];
                    let dx = next.x as isize - cell.x as isize;
                    let dy = next.y as isize - cell.y as isize;
                    if let Some(direction) = Direction::from_delta(dx, dy) {
                        trace!(?cell, ?direction, "ghost turning");
                        self.direction = Some(direction);
                    }
                }
                Err(err) => warn!(%err, ?cell, "ghost holding its heading"),
            }
        }
        step_velocity(&mut self.body, grid, self.direction, cell_size, tick_rate);
    }
}

impl Agent for Ghost {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn heading(&self) -> Option<Direction> {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::tests::parse_grid;

    const CELL: f32 = 32.0;
    const TICK: f32 = 60.0;

    const OPEN_7X7: [&str; 7] = [
        "#######", //
        "#.....#", //
        "#.#.#.#", //
        "#.....#", //
        "#.#.#.#", //
        "#.....#", //
        "#######",
    ];

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::splat(CELL), 100.0)
    }

    #[test]
    fn blocked_turn_then_open_turn() {
        let grid = parse_grid(&[
            "#.###", //
            "#.#.#", //
            "#.#.#", //
            "#...#", //
            "#####",
        ]);
        let mut body = body_at(32.0, 32.0);

        assert!(step_velocity(&mut body, &grid, Some(Direction::Right), CELL, TICK));
        assert_eq!(body.velocity, Vec2::ZERO);

        step_velocity(&mut body, &grid, Some(Direction::Up), CELL, TICK);
        assert_eq!(body.velocity, Vec2::new(0.0, -100.0));
    }

    #[test]
    fn keeps_coasting_past_a_closed_side_corridor() {
        let grid = parse_grid(&[
            "#####", //
            "#...#", //
            "#####",
        ]);
        let mut body = body_at(32.0, 32.0);
        body.velocity = Vec2::new(100.0, 0.0);

        step_velocity(&mut body, &grid, Some(Direction::Up), CELL, TICK);
        assert_eq!(body.velocity, Vec2::new(100.0, 0.0));

        // At the far end both the wish and the current heading are walled off.
        body.position = Vec2::new(96.0, 32.0);
        step_velocity(&mut body, &grid, Some(Direction::Up), CELL, TICK);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn ignores_input_between_decision_points() {
        let grid = parse_grid(&OPEN_7X7);
        let mut body = body_at(40.0, 32.0);
        body.velocity = Vec2::new(100.0, 0.0);

        assert!(!step_velocity(&mut body, &grid, Some(Direction::Left), CELL, TICK));
        assert_eq!(body.velocity, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn no_input_stops_at_decision_point() {
        let grid = parse_grid(&OPEN_7X7);
        let mut body = body_at(32.0, 32.0);
        body.velocity = Vec2::new(100.0, 0.0);

        step_velocity(&mut body, &grid, None, CELL, TICK);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn decision_window_scales_with_speed() {
        let mut body = body_at(33.5, 32.0);
        assert!(body.is_at_decision_point(CELL, TICK));
        body.position.x = 34.0;
        assert!(!body.is_at_decision_point(CELL, TICK));
        body.speed = 200.0;
        assert!(body.is_at_decision_point(CELL, TICK));
    }

    #[test]
    fn pickups_are_collected_once() {
        let mut grid = parse_grid(&[
            "#####", //
            "#o.o#", //
            "#####",
        ]);
        let mut pacman = Pacman::new(body_at(32.0, 32.0));

        assert!(pacman.collect_bits(&mut grid, CELL, TICK));
        assert_eq!(grid.cell_kind_at(1, 1), CellKind::Open);
        assert_eq!(pacman.score(), 1);

        assert!(!pacman.collect_bits(&mut grid, CELL, TICK));
        assert_eq!(pacman.score(), 1);
        assert_eq!(grid.pickup_count(), 1);
    }

    #[test]
    fn pickups_need_a_decision_point() {
        let mut grid = parse_grid(&[
            "#####", //
            "#o.o#", //
            "#####",
        ]);
        let mut pacman = Pacman::new(body_at(48.0, 32.0));
        assert!(!pacman.collect_bits(&mut grid, CELL, TICK));
        assert_eq!(pacman.score(), 0);
    }

    #[test]
    fn pacman_follows_its_direction() {
        let grid = parse_grid(&OPEN_7X7);
        let mut pacman = Pacman::new(body_at(32.0, 32.0));
        pacman.set_direction(Direction::Down);
        pacman.step_velocity(&grid, CELL, TICK);
        assert_eq!(pacman.body().velocity, Vec2::new(0.0, 100.0));

        pacman.advance(0.5);
        assert_eq!(pacman.body().position, Vec2::new(32.0, 82.0));
        assert_eq!(pacman.heading(), Some(Direction::Down));
    }

    #[test]
    fn ghost_heads_along_the_shortest_route() {
        let grid = parse_grid(&[
            "#######", //
            "#.....#", //
            "#####.#", //
            "#.#.#.#", //
            "#####.#", //
            "#.#.#.#", //
            "#######",
        ]);
        let mut ghost = Ghost::new(Body::at_cell(Position::new(5, 5), CELL, 100.0));
        ghost.step_velocity(&grid, Position::new(1, 1), CELL, TICK);
        assert_eq!(ghost.heading(), Some(Direction::Up));
        assert_eq!(ghost.body().velocity, Vec2::new(0.0, -100.0));
    }

    #[test]
    fn ghost_snaps_even_targets_onto_rooms() {
        let grid = parse_grid(&OPEN_7X7);
        let mut ghost = Ghost::new(Body::at_cell(Position::new(1, 1), CELL, 100.0));
        // (4, 1) snaps to room (3, 1), directly to the right.
        ghost.step_velocity(&grid, Position::new(4, 1), CELL, TICK);
        assert_eq!(ghost.heading(), Some(Direction::Right));
    }

    #[test]
    fn ghost_on_its_target_keeps_heading() {
        let grid = parse_grid(&OPEN_7X7);
        let mut ghost = Ghost::new(Body::at_cell(Position::new(3, 3), CELL, 100.0));
        ghost.direction = Some(Direction::Left);
        ghost.step_velocity(&grid, Position::new(3, 3), CELL, TICK);
        assert_eq!(ghost.heading(), Some(Direction::Left));
        assert_eq!(ghost.body().velocity, Vec2::new(-100.0, 0.0));
    }

    #[test]
    fn unreachable_target_keeps_heading() {
        let grid = parse_grid(&[
            "#######", //
            "#.....#", //
            "#.#.#.#", //
            "#.....#", //
            "#.#.###", //
            "#...#.#", //
            "#######",
        ]);
        let mut ghost = Ghost::new(Body::at_cell(Position::new(1, 1), CELL, 100.0));
        ghost.direction = Some(Direction::Down);
        ghost.step_velocity(&grid, Position::new(5, 5), CELL, TICK);
        assert_eq!(ghost.heading(), Some(Direction::Down));
        assert_eq!(ghost.body().velocity, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn bounding_box_covers_the_body() {
        let body = body_at(64.0, 32.0);
        let bounds = body.bounding_box();
        assert_eq!(bounds.min, Vec2::new(64.0, 32.0));
        assert_eq!(bounds.max, Vec2::new(96.0, 64.0));
        assert_eq!(bounds.center(), body.center());
    }
}
