use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of the square game grid
    pub grid_size: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,
    /// Points awarded per food consumed
    pub points_per_food: u32,
    /// Simulation tick cadence in milliseconds
    pub tick_interval_ms: u64,
    /// Delay between game over and the high score check, in milliseconds.
    /// Lets the final state stay on screen before the name prompt opens.
    pub highscore_check_delay_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            initial_snake_length: 3,
            points_per_food: 10,
            tick_interval_ms: 150,
            highscore_check_delay_ms: 600,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom grid size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn highscore_check_delay(&self) -> Duration {
        Duration::from_millis(self.highscore_check_delay_ms)
    }
}
