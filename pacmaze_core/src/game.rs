use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    Direction, Position,
    agent::{Agent, Body, Ghost, Pacman},
    config::{ConfigError, Difficulty, GameConfig, check_dimensions},
    generator::MazeGenerator,
    map::{CellKind, Grid},
};

/// How far (in cells) the player must be from a ghost before an expert
/// ghost shifts its target by one cell.
const SPREAD_FALLOFF_CELLS: f32 = 4.0;

const PLAYER_SPAWN: Position = Position::new(1, 1);

/// The four pursuers, in spawn order from left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostKind {
    Red,
    Yellow,
    Pink,
    Blue,
}

impl GhostKind {
    pub const ALL: [GhostKind; 4] = [
        GhostKind::Red,
        GhostKind::Yellow,
        GhostKind::Pink,
        GhostKind::Blue,
    ];

    pub fn index(self) -> usize {
        match self {
            GhostKind::Red => 0,
            GhostKind::Yellow => 1,
            GhostKind::Pink => 2,
            GhostKind::Blue => 3,
        }
    }

    /// Axis along which this ghost pushes its target on [`Difficulty::ExpertPlus`].
    fn spread(self) -> Vec2 {
        match self {
            GhostKind::Red => Vec2::X,
            GhostKind::Yellow => Vec2::NEG_X,
            GhostKind::Pink => Vec2::Y,
            GhostKind::Blue => Vec2::NEG_Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    /// A ghost reached the player; the run is over.
    Caught,
}

/// One maze, one player and four ghosts, advanced a tick at a time.
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    maze: Grid<CellKind>,
    player: Pacman,
    ghosts: [Ghost; 4],
    state: GameState,
    /// Ghosts stay put until the player first moves.
    started: bool,
    ticks: u64,
}

impl Game {
    /// Generates a fresh maze and places everyone on it.
    pub fn new<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;
        let maze = MazeGenerator::new(config.max_generation_attempts).generate(
            config.width,
            config.height,
            rng,
        )?;
        Game::with_maze(config, maze)
    }

    /// Starts a session on an existing maze. The maze's own dimensions win over the config's.
    pub fn with_maze(config: GameConfig, maze: Grid<CellKind>) -> Result<Self, ConfigError> {
        check_dimensions(maze.width(), maze.height())?;
        config.validate_rates()?;
        let cell_size = config.cell_size;
        let player = Pacman::new(Body::at_cell(PLAYER_SPAWN, cell_size, config.player_speed));
        let ghost_speed = config.difficulty.ghost_speed();
        let ghosts = ghost_spawns(maze.width(), maze.height())
            .map(|cell| Ghost::new(Body::at_cell(cell, cell_size, ghost_speed)));

        debug!(
            width = maze.width(),
            height = maze.height(),
            difficulty = ?config.difficulty,
            pickups = maze.pickup_count(),
            "level ready"
        );

        Ok(Game {
            config,
            maze,
            player,
            ghosts,
            state: GameState::Playing,
            started: false,
            ticks: 0,
        })
    }

    /// Steers the player. The first call also releases the ghosts.
    pub fn set_player_direction(&mut self, direction: Direction) {
        if self.state != GameState::Playing {
            return;
        }
        if !self.started {
            info!("first input received, releasing ghosts");
        }
        self.started = true;
        self.player.set_direction(direction);
    }

    /// Runs one simulation step: player movement, pickups, ghost steering,
    /// the catch check and finally integration of all velocities.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameState {
        if self.state != GameState::Playing {
            return self.state;
        }
        let (cell_size, tick_rate) = (self.config.cell_size, self.config.tick_rate);

        self.player.step_velocity(&self.maze, cell_size, tick_rate);
        if self.player.collect_bits(&mut self.maze, cell_size, tick_rate) {
            trace!(score = self.player.score(), "pickup collected");
        }

        if self.started {
            let targets = self.ghost_targets(rng);
            for (ghost, target) in self.ghosts.iter_mut().zip(targets) {
                ghost.step_velocity(&self.maze, target, cell_size, tick_rate);
            }
        }

        let player_center = self.player.bounding_box().center();
        let caught = self.ghosts.iter().any(|ghost| {
            ghost.bounding_box().center().distance(player_center) < self.config.catch_radius
        });
        if caught {
            self.state = GameState::Caught;
            info!(
                ticks = self.ticks,
                score = self.final_score(),
                "player caught"
            );
        }

        let dt = self.config.tick_duration();
        self.player.advance(dt);
        for ghost in &mut self.ghosts {
            ghost.advance(dt);
        }
        self.ticks += 1;
        self.state
    }

    /// Room each ghost is steering toward this tick.
    fn ghost_targets<R: Rng + ?Sized>(&self, rng: &mut R) -> [Position; 4] {
        let (width, height) = (self.maze.width(), self.maze.height());
        let cell_size = self.config.cell_size;
        let player = self.player.body();
        // Nearest even cell around the player's center; snapped onto a room below.
        let anchor = (player.center() / cell_size / 2.0).round() * 2.0;

        GhostKind::ALL.map(|kind| match self.config.difficulty {
            Difficulty::Easy => Position::new(
                rng.random_range(0..width / 2) * 2 + 1,
                rng.random_range(0..height / 2) * 2 + 1,
            ),
            Difficulty::ExpertPlus => {
                let ghost = self.ghosts[kind.index()].body();
                let cells_apart = player.position.distance(ghost.position) / cell_size;
                let shifted = anchor + kind.spread() * (cells_apart / SPREAD_FALLOFF_CELLS);
                clamp_to_room(shifted, width, height)
            }
            Difficulty::Medium | Difficulty::Hard | Difficulty::Expert => {
                clamp_to_room(anchor, width, height)
            }
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn maze(&self) -> &Grid<CellKind> {
        &self.maze
    }

    pub fn player(&self) -> &Pacman {
        &self.player
    }

    pub fn ghost(&self, kind: GhostKind) -> &Ghost {
        &self.ghosts[kind.index()]
    }

    pub fn ghosts(&self) -> impl Iterator<Item = (GhostKind, &Ghost)> {
        GhostKind::ALL.into_iter().zip(self.ghosts.iter())
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Grid cell under the agent's center, for drawing.
    pub fn cell_of<A: Agent>(&self, agent: &A) -> Position {
        agent.body().center_cell(self.config.cell_size)
    }

    pub fn pickups_remaining(&self) -> usize {
        self.maze.pickup_count()
    }

    /// Collected pickups weighted by the difficulty multiplier.
    pub fn final_score(&self) -> u32 {
        self.player.score() * self.config.difficulty.score_multiplier()
    }
}

/// Truncates `cell` to integers, clamps it inside the outer ring and snaps it onto a room.
fn clamp_to_room(cell: Vec2, width: usize, height: usize) -> Position {
    let clamp = |v: f32, len: usize| (v as isize).clamp(1, len as isize - 2) as usize;
    Position::new(clamp(cell.x, width), clamp(cell.y, height)).to_room()
}

/// Four rooms on the middle row, two either side of the center column.
fn ghost_spawns(width: usize, height: usize) -> [Position; 4] {
    let center = (width / 2 & !1) as isize;
    let row = ((height / 2) | 1).min(height - 2);
    [-3, -1, 1, 3].map(|dx| {
        let x = (center + dx).clamp(1, width as isize - 2) as usize;
        Position::new(x, row).to_room()
    })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{generator::GenerationError, pathfinding::tests::parse_grid};

    const OPEN_7X7: [&str; 7] = [
        "#######", //
        "#o.o.o#", //
        "#.#.#.#", //
        "#o.o.o#", //
        "#.#.#.#", //
        "#o.o.o#", //
        "#######",
    ];

    fn small_game(difficulty: Difficulty) -> Game {
        let config = GameConfig {
            difficulty,
            ..GameConfig::default()
        };
        Game::with_maze(config, parse_grid(&OPEN_7X7)).unwrap()
    }

    #[test]
    fn spawns_match_default_layout() {
        let mut rng = StdRng::seed_from_u64(5);
        let game = Game::new(GameConfig::default(), &mut rng).unwrap();

        assert_eq!(game.player().body().position, Vec2::new(32.0, 32.0));
        let spawns: Vec<Vec2> = game.ghosts().map(|(_, g)| g.body().position).collect();
        assert_eq!(
            spawns,
            vec![
                Vec2::new(288.0, 224.0),
                Vec2::new(352.0, 224.0),
                Vec2::new(416.0, 224.0),
                Vec2::new(480.0, 224.0),
            ]
        );
        assert_eq!(game.pickups_remaining(), 12 * 7);
    }

    #[test]
    fn spawns_stay_on_rooms_in_small_mazes() {
        for (width, height) in [(3, 3), (5, 5), (7, 7), (9, 5), (23, 17)] {
            for cell in ghost_spawns(width, height) {
                assert!(cell.is_room(), "{cell:?} in {width}x{height}");
                assert!(cell.x < width - 1 && cell.y < height - 1);
            }
        }
    }

    #[test]
    fn ghosts_wait_for_first_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = small_game(Difficulty::Expert);
        let before: Vec<Vec2> = game.ghosts().map(|(_, g)| g.body().position).collect();
        for _ in 0..30 {
            game.tick(&mut rng);
        }
        let after: Vec<Vec2> = game.ghosts().map(|(_, g)| g.body().position).collect();
        assert_eq!(before, after);
        assert!(!game.is_started());
    }

    #[test]
    fn first_tick_eats_the_spawn_pickup() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = small_game(Difficulty::Medium);
        game.tick(&mut rng);
        assert_eq!(game.player().score(), 1);
        assert_eq!(game.pickups_remaining(), 8);
        assert_eq!(game.final_score(), 2);
    }

    #[test]
    fn ghost_catches_approaching_player() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = small_game(Difficulty::Expert);
        game.set_player_direction(Direction::Down);

        let caught_at = (0..120).find(|_| game.tick(&mut rng) == GameState::Caught);
        assert!(caught_at.is_some(), "player was never caught");

        let frozen = game.player().body().position;
        assert_eq!(game.tick(&mut rng), GameState::Caught);
        assert_eq!(game.player().body().position, frozen);

        game.set_player_direction(Direction::Up);
        assert_eq!(game.player().heading(), Some(Direction::Down));
    }

    #[test]
    fn easy_targets_are_random_rooms() {
        let mut rng = StdRng::seed_from_u64(9);
        let game = small_game(Difficulty::Easy);
        for _ in 0..50 {
            for target in game.ghost_targets(&mut rng) {
                assert!(game.maze().is_room(target), "{target:?}");
            }
        }
    }

    #[test]
    fn chasing_ghosts_target_the_player_room() {
        let mut rng = StdRng::seed_from_u64(9);
        let game = small_game(Difficulty::Hard);
        assert_eq!(game.ghost_targets(&mut rng), [Position::new(1, 1); 4]);
    }

    #[test]
    fn expert_plus_targets_fan_out_and_stay_inside() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut rng_maze = StdRng::seed_from_u64(4);
        let config = GameConfig {
            difficulty: Difficulty::ExpertPlus,
            ..GameConfig::default()
        };
        let game = Game::new(config, &mut rng_maze).unwrap();
        let targets = game.ghost_targets(&mut rng);

        // Player sits in the top-left corner, so the pushes toward -x and -y clamp back to it.
        assert_eq!(targets[GhostKind::Yellow.index()], Position::new(1, 1));
        assert_eq!(targets[GhostKind::Blue.index()], Position::new(1, 1));
        assert!(targets[GhostKind::Red.index()].x > 1);
        assert!(targets[GhostKind::Pink.index()].y > 1);
        for target in targets {
            assert!(game.maze().is_room(target), "{target:?}");
        }
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = GameConfig {
                difficulty: Difficulty::Easy,
                ..GameConfig::default()
            };
            let mut game = Game::new(config, &mut rng).unwrap();
            game.set_player_direction(Direction::Right);
            for _ in 0..240 {
                game.tick(&mut rng);
            }
            (
                game.player().clone(),
                game.ghosts().map(|(_, g)| g.clone()).collect::<Vec<_>>(),
                game.maze().clone(),
            )
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    fn undersized_mazes_are_rejected() {
        let shapes: [&[&str]; 3] = [
            &["###", "#.#"],
            &["##", "##", "##"],
            &["#####", "#...#", "#...#", "#####"],
        ];
        for rows in shapes {
            let maze = parse_grid(rows);
            let (width, height) = (maze.width(), maze.height());
            assert_eq!(
                Game::with_maze(GameConfig::default(), maze).err(),
                Some(ConfigError::Maze(GenerationError::InvalidDimensions { width, height }))
            );
        }
    }

    #[test]
    fn smallest_maze_starts_a_session() {
        let maze = parse_grid(&["###", "#o#", "###"]);
        let game = Game::with_maze(GameConfig::default(), maze).unwrap();
        for (_, ghost) in game.ghosts() {
            assert_eq!(game.cell_of(ghost), Position::new(1, 1));
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = GameConfig {
            height: 10,
            ..GameConfig::default()
        };
        assert!(matches!(
            Game::new(config, &mut rng),
            Err(ConfigError::Maze(_))
        ));
    }
}
