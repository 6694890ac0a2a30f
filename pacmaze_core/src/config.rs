use serde::{Deserialize, Serialize};

use crate::generator::{DEFAULT_MAX_ATTEMPTS, GenerationError};

/// How aggressively the ghosts hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Fast ghosts wandering to random rooms.
    Easy,
    Medium,
    Hard,
    Expert,
    /// Ghosts spread their targets around the player to cut off escape routes.
    #[default]
    ExpertPlus,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::ExpertPlus,
    ];

    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
            Difficulty::Expert => 3,
            Difficulty::ExpertPlus => 4,
        }
    }

    /// Next difficulty, wrapping from the hardest back to the easiest.
    pub fn next(self) -> Difficulty {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous difficulty, wrapping from the easiest to the hardest.
    pub fn previous(self) -> Difficulty {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Ghost speed in world units per second.
    pub fn ghost_speed(self) -> f32 {
        match self {
            Difficulty::Easy => 200.0,
            Difficulty::Medium => 50.0,
            Difficulty::Hard => 75.0,
            Difficulty::Expert | Difficulty::ExpertPlus => 100.0,
        }
    }

    /// Each pickup is worth `2^index` points at the end of a run.
    pub fn score_multiplier(self) -> u32 {
        1 << self.index()
    }
}

/// Errors raised by [`GameConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Maze(#[from] GenerationError),
    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f32 },
}

/// Tunables for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maze width in cells, odd.
    pub width: usize,
    /// Maze height in cells, odd.
    pub height: usize,
    /// World units per grid cell.
    pub cell_size: f32,
    /// Simulation ticks per second.
    pub tick_rate: f32,
    pub player_speed: f32,
    /// A ghost closer than this to the player ends the run.
    pub catch_radius: f32,
    pub max_generation_attempts: usize,
    pub difficulty: Difficulty,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 25,
            height: 15,
            cell_size: 32.0,
            tick_rate: 60.0,
            player_speed: 100.0,
            catch_radius: 16.0,
            max_generation_attempts: DEFAULT_MAX_ATTEMPTS,
            difficulty: Difficulty::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimensions(self.width, self.height)?;
        self.validate_rates()
    }

    /// Checks everything but the maze dimensions.
    pub(crate) fn validate_rates(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("cell_size", self.cell_size),
            ("tick_rate", self.tick_rate),
            ("player_speed", self.player_speed),
            ("catch_radius", self.catch_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        Ok(())
    }

    /// Seconds simulated by one tick.
    pub fn tick_duration(&self) -> f32 {
        1.0 / self.tick_rate
    }
}

/// Mazes must be odd-sized and at least 3x3 so the border ring surrounds a room.
pub(crate) fn check_dimensions(width: usize, height: usize) -> Result<(), GenerationError> {
    if width < 3 || height < 3 || width % 2 == 0 || height % 2 == 0 {
        return Err(GenerationError::InvalidDimensions { width, height });
    }
    Ok(())
}
