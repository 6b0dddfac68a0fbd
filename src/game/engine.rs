use super::{
    action::{Command, Direction},
    config::GameConfig,
    state::{CollisionKind, GamePhase, GameState, Position, Snake},
};
use rand::Rng;
use rand::rngs::ThreadRng;

/// Result of a simulation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Whether the snake moved this tick
    pub advanced: bool,
    /// Whether the snake ate food this tick
    pub ate_food: bool,
    /// Collision that ended the game, if one occurred
    pub collision: Option<CollisionKind>,
}

impl TickOutcome {
    fn idle() -> Self {
        Self {
            advanced: false,
            ate_food: false,
            collision: None,
        }
    }
}

/// The game engine owning the authoritative simulation state.
///
/// Driven externally: a timer invokes [`tick`](Self::tick) at a fixed
/// cadence and an input source forwards [`Command`]s. Observers read the
/// current [`GameState`] through [`state`](Self::state).
pub struct GameEngine {
    config: GameConfig,
    rng: ThreadRng,
    state: GameState,
    /// Score captured at the moment of the fatal collision, consumed
    /// exactly once by the deferred high score check
    final_score: Option<u32>,
}

impl GameEngine {
    /// Create a new engine in the waiting phase
    pub fn new(config: GameConfig) -> Self {
        let mut rng = rand::thread_rng();
        let state = initial_state(&config, &mut rng);

        Self {
            config,
            rng,
            state,
            final_score: None,
        }
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Dispatch a command to the matching operation
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Steer(direction) => self.set_direction(direction),
            Command::TogglePause => self.toggle_pause(),
            Command::Reset => self.reset(),
        }
    }

    /// Begin the simulation. No-op unless the phase is `Waiting`.
    pub fn start(&mut self) {
        if self.state.phase == GamePhase::Waiting {
            self.state.phase = GamePhase::Playing;
        }
    }

    /// Toggle between `Playing` and `Paused`. No-op from any other phase.
    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }

    /// Change the heading in effect for the next tick.
    ///
    /// Ignored while waiting or game over, and when the request is
    /// anti-parallel to the heading already in effect. Between ticks the
    /// last accepted call wins.
    pub fn set_direction(&mut self, direction: Direction) {
        if !matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused) {
            return;
        }
        if self.state.snake.direction.is_opposite(direction) {
            return;
        }
        self.state.snake.direction = direction;
    }

    /// Advance the simulation by one step. Ticks delivered in any phase
    /// other than `Playing` are ignored.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.phase != GamePhase::Playing {
            return TickOutcome::idle();
        }

        let new_head = self
            .state
            .snake
            .head()
            .moved_in_direction(self.state.snake.direction);

        // Collision is checked against the pre-move body, tail included:
        // moving into the cell the tail is about to vacate is fatal.
        if let Some(kind) = self.check_collision(new_head) {
            self.state.phase = GamePhase::GameOver;
            self.final_score = Some(self.state.score);
            tracing::debug!(score = self.state.score, ?kind, "game over");

            return TickOutcome {
                advanced: false,
                ate_food: false,
                collision: Some(kind),
            };
        }

        let ate_food = new_head == self.state.food;
        self.state.snake.advance(ate_food);

        if ate_food {
            self.state.score += self.config.points_per_food;
            self.state.food = spawn_food(&mut self.rng, &self.state.snake, self.config.grid_size);
        }

        TickOutcome {
            advanced: true,
            ate_food,
            collision: None,
        }
    }

    /// Return to the initial waiting state, discarding any pending
    /// high score check
    pub fn reset(&mut self) {
        self.state = initial_state(&self.config, &mut self.rng);
        self.final_score = None;
    }

    /// Take the score frozen at game over. Yields `Some` exactly once per
    /// finished game; `reset` clears it, so a check that fires after a
    /// reset finds nothing.
    pub fn take_final_score(&mut self) -> Option<u32> {
        self.final_score.take()
    }

    fn check_collision(&self, pos: Position) -> Option<CollisionKind> {
        if !self.state.is_in_bounds(pos) {
            return Some(CollisionKind::Wall);
        }

        if self.state.snake.occupies(pos) {
            return Some(CollisionKind::SelfCollision);
        }

        None
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}

fn initial_state(config: &GameConfig, rng: &mut ThreadRng) -> GameState {
    let center = (config.grid_size / 2) as i32;

    let snake = Snake::new(
        Position::new(center, center),
        Direction::Right,
        config.initial_snake_length,
    );

    let food = spawn_food(rng, &snake, config.grid_size);

    GameState::new(snake, food, config.grid_size)
}

/// Pick a uniformly random cell not occupied by the snake. The snake
/// covers a strict subset of the grid in any reachable state, so the
/// resample loop terminates.
fn spawn_food(rng: &mut ThreadRng, snake: &Snake, grid_size: usize) -> Position {
    loop {
        let x = rng.gen_range(0..grid_size) as i32;
        let y = rng.gen_range(0..grid_size) as i32;
        let pos = Position::new(x, y);

        if !snake.occupies(pos) {
            return pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn playing_engine(config: GameConfig) -> GameEngine {
        let mut engine = GameEngine::new(config);
        engine.start();
        engine
    }

    #[test]
    fn test_new_engine_is_waiting() {
        let engine = GameEngine::new(GameConfig::default());
        let state = engine.state();

        assert_eq!(state.phase, GamePhase::Waiting);
        assert_eq!(state.score, 0);
        assert_eq!(state.snake.len(), 3);
        assert!(!state.snake.occupies(state.food));
    }

    #[test]
    fn test_start_only_from_waiting() {
        let mut engine = GameEngine::new(GameConfig::small());
        engine.start();
        assert_eq!(engine.state().phase, GamePhase::Playing);

        engine.toggle_pause();
        engine.start();
        assert_eq!(engine.state().phase, GamePhase::Paused);
    }

    #[test]
    fn test_tick_ignored_while_waiting() {
        let mut engine = GameEngine::new(GameConfig::small());
        let before = engine.state().clone();

        let outcome = engine.tick();

        assert!(!outcome.advanced);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_toggle_pause_freezes_ticks() {
        let mut engine = playing_engine(GameConfig::small());
        engine.toggle_pause();
        assert_eq!(engine.state().phase, GamePhase::Paused);

        let before = engine.state().snake.clone();
        let outcome = engine.tick();
        assert!(!outcome.advanced);
        assert_eq!(engine.state().snake, before);

        engine.toggle_pause();
        assert_eq!(engine.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_basic_movement_keeps_length() {
        let mut engine = playing_engine(GameConfig::small());
        // Keep the move deterministic: food out of the snake's path
        engine.state_mut().food = Position::new(0, 9);
        let initial_head = engine.state().snake.head();
        let initial_len = engine.state().snake.len();

        let outcome = engine.tick();

        assert!(outcome.advanced);
        assert!(!outcome.ate_food);
        assert_eq!(engine.state().snake.len(), initial_len);
        assert_ne!(engine.state().snake.head(), initial_head);
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = playing_engine(GameConfig::small());

        // Place food directly in front of the snake
        let head = engine.state().snake.head();
        let direction = engine.state().snake.direction;
        engine.state_mut().food = head.moved_in_direction(direction);
        let initial_len = engine.state().snake.len();

        let outcome = engine.tick();

        assert!(outcome.ate_food);
        assert_eq!(engine.state().score, 10);
        assert_eq!(engine.state().snake.len(), initial_len + 1);
        // Regenerated food avoids the grown snake
        assert!(!engine.state().snake.occupies(engine.state().food));
    }

    #[test]
    fn test_wall_collision_leaves_state_frozen() {
        let mut engine = playing_engine(GameConfig::small());
        engine.state_mut().snake = Snake::new(Position::new(0, 5), Direction::Left, 3);
        engine.state_mut().score = 30;
        let snake_before = engine.state().snake.clone();
        let food_before = engine.state().food;

        let outcome = engine.tick();

        assert_eq!(outcome.collision, Some(CollisionKind::Wall));
        assert!(!outcome.advanced);
        assert_eq!(engine.state().phase, GamePhase::GameOver);
        assert_eq!(engine.state().snake, snake_before);
        assert_eq!(engine.state().food, food_before);
        assert_eq!(engine.state().score, 30);
    }

    #[test]
    fn test_self_collision() {
        let mut engine = playing_engine(GameConfig::small());

        // Snake at (5, 5) going Right with length 4
        // Body: (5,5), (4,5), (3,5), (2,5)
        engine.state_mut().snake = Snake::new(Position::new(5, 5), Direction::Right, 4);
        engine.state_mut().food = Position::new(9, 9);

        // Right: (6,5), (5,5), (4,5), (3,5)
        engine.tick();
        // Down: (6,6), (6,5), (5,5), (4,5)
        engine.set_direction(Direction::Down);
        engine.tick();
        // Left: (5,6), (6,6), (6,5), (5,5)
        engine.set_direction(Direction::Left);
        engine.tick();
        // Up: (5,5) - collides with the 3rd remaining segment
        engine.set_direction(Direction::Up);
        let outcome = engine.tick();

        assert_eq!(outcome.collision, Some(CollisionKind::SelfCollision));
        assert_eq!(engine.state().phase, GamePhase::GameOver);
    }

    #[test]
    fn test_tail_chase_is_fatal() {
        let mut engine = playing_engine(GameConfig::small());

        // Closed 2x2 loop: the next head cell is the tail cell, which
        // would be vacated this same tick. The pre-move check makes the
        // move fatal anyway.
        let snake = Snake {
            body: vec![
                Position::new(5, 5),
                Position::new(4, 5),
                Position::new(4, 6),
                Position::new(5, 6),
            ],
            direction: Direction::Down,
        };
        engine.state_mut().snake = snake;

        let outcome = engine.tick();

        assert_eq!(outcome.collision, Some(CollisionKind::SelfCollision));
        assert_eq!(engine.state().phase, GamePhase::GameOver);
    }

    #[test]
    fn test_reversal_rejected() {
        let mut engine = playing_engine(GameConfig::small());
        engine.state_mut().snake.direction = Direction::Right;

        engine.set_direction(Direction::Left);
        assert_eq!(engine.state().snake.direction, Direction::Right);

        // Perpendicular turns are accepted, and each accepted turn is the
        // new baseline for the reversal check
        engine.set_direction(Direction::Up);
        assert_eq!(engine.state().snake.direction, Direction::Up);
        engine.set_direction(Direction::Down);
        assert_eq!(engine.state().snake.direction, Direction::Up);
    }

    #[test]
    fn test_steering_ignored_outside_play() {
        let mut engine = GameEngine::new(GameConfig::small());
        let initial = engine.state().snake.direction;

        engine.set_direction(Direction::Up);
        assert_eq!(engine.state().snake.direction, initial);

        engine.start();
        engine.state_mut().phase = GamePhase::GameOver;
        engine.set_direction(Direction::Up);
        assert_eq!(engine.state().snake.direction, initial);
    }

    #[test]
    fn test_steering_accepted_while_paused() {
        let mut engine = playing_engine(GameConfig::small());
        engine.toggle_pause();

        engine.set_direction(Direction::Up);
        assert_eq!(engine.state().snake.direction, Direction::Up);
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut engine = playing_engine(GameConfig::small());
        engine.state_mut().score = 50;
        engine.state_mut().snake = Snake::new(Position::new(0, 5), Direction::Left, 3);
        engine.tick(); // wall collision

        engine.reset();
        let state = engine.state();

        assert_eq!(state.phase, GamePhase::Waiting);
        assert_eq!(state.score, 0);
        assert_eq!(state.snake.len(), 3);
        assert_eq!(state.snake.direction, Direction::Right);
        assert!(!state.snake.occupies(state.food));
        assert_eq!(engine.take_final_score(), None);
    }

    #[test]
    fn test_final_score_taken_once() {
        let mut engine = playing_engine(GameConfig::small());
        engine.state_mut().score = 40;
        engine.state_mut().snake = Snake::new(Position::new(0, 5), Direction::Left, 3);
        engine.tick();

        assert_eq!(engine.take_final_score(), Some(40));
        assert_eq!(engine.take_final_score(), None);
    }

    #[test]
    fn test_no_duplicate_segments_while_growing() {
        let mut engine = playing_engine(GameConfig::small());

        for _ in 0..5 {
            // Feed the snake every tick and check the body stays disjoint
            let head = engine.state().snake.head();
            let direction = engine.state().snake.direction;
            let next = head.moved_in_direction(direction);
            if !engine.state().is_in_bounds(next) {
                break;
            }
            engine.state_mut().food = next;

            let outcome = engine.tick();
            assert!(outcome.ate_food);

            let body = &engine.state().snake.body;
            let unique: HashSet<_> = body.iter().collect();
            assert_eq!(unique.len(), body.len());
            assert!(!engine.state().snake.occupies(engine.state().food));
        }
    }
}
