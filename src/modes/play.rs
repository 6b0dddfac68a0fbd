use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{Instant, interval, sleep_until};

use crate::game::{Command, GameConfig, GameEngine, GamePhase};
use crate::input::{InputHandler, KeyAction, NameEntryAction};
use crate::metrics::SessionStats;
use crate::render::Renderer;
use crate::scores::{HighScores, MAX_NAME_LEN, ScoreStore};

pub struct PlayMode<S> {
    config: GameConfig,
    engine: GameEngine,
    scores: HighScores<S>,
    stats: SessionStats,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
    /// Live name prompt buffer while a qualifying score awaits a name
    name_entry: Option<String>,
    /// Final score waiting to be committed with the entered name
    candidate_score: Option<u32>,
    /// Deadline of the deferred high score check; disarmed by reset
    check_at: Option<Instant>,
}

impl<S: ScoreStore> PlayMode<S> {
    pub fn new(config: GameConfig, scores: HighScores<S>) -> Self {
        let engine = GameEngine::new(config.clone());

        Self {
            config,
            engine,
            scores,
            stats: SessionStats::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
            name_entry: None,
            candidate_score: None,
            check_at: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = interval(self.config.tick_interval());

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            let check_at = self.check_at;

            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick; the engine ignores ticks unless playing
                _ = tick_timer.tick() => {
                    let outcome = self.engine.tick();
                    if outcome.collision.is_some() {
                        self.stats.on_game_over();
                        self.check_at =
                            Some(Instant::now() + self.config.highscore_check_delay());
                    }
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.stats.update();
                    terminal.draw(|frame| {
                        self.renderer.render(
                            frame,
                            self.engine.state(),
                            self.scores.records(),
                            &self.stats,
                            self.name_entry.as_deref(),
                        );
                    }).context("Failed to draw frame")?;
                }

                // Deferred high score check, armed by a fatal tick
                _ = sleep_until(check_at.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600))),
                        if check_at.is_some() => {
                    self.check_at = None;
                    self.run_high_score_check();
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else { return };
        // Only process key press events, not release
        if key.kind != KeyEventKind::Press {
            return;
        }

        // The open name prompt captures the keyboard
        if self.name_entry.is_some() {
            match self.input_handler.handle_name_entry_key(key) {
                NameEntryAction::Push(c) => {
                    if let Some(buffer) = &mut self.name_entry {
                        if buffer.chars().count() < MAX_NAME_LEN {
                            buffer.push(c);
                        }
                    }
                }
                NameEntryAction::Pop => {
                    if let Some(buffer) = &mut self.name_entry {
                        buffer.pop();
                    }
                }
                NameEntryAction::Submit => self.submit_name(),
                NameEntryAction::Skip => self.dismiss_prompt(),
                NameEntryAction::Quit => self.should_quit = true,
                NameEntryAction::None => {}
            }
            return;
        }

        match self.input_handler.handle_key_event(key) {
            KeyAction::Game(Command::Reset) => self.reset_game(),
            KeyAction::Game(command) => {
                if command == Command::Start && self.engine.state().phase == GamePhase::Waiting {
                    self.stats.on_game_start();
                }
                self.engine.apply(command);
            }
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    /// Runs once per finished game, after the deliberate delay. A reset
    /// in the meantime cleared both the deadline and the engine's frozen
    /// score, so a stale firing finds nothing to do.
    fn run_high_score_check(&mut self) {
        if let Some(score) = self.engine.take_final_score() {
            if self.scores.qualifies(score) {
                self.candidate_score = Some(score);
                self.name_entry = Some(String::new());
            }
        }
    }

    fn submit_name(&mut self) {
        let Some(buffer) = self.name_entry.take() else {
            return;
        };

        let name = buffer.trim().to_string();
        if name.is_empty() {
            // Keep the prompt open until a usable name or an explicit skip
            self.name_entry = Some(buffer);
            return;
        }

        if let Some(score) = self.candidate_score.take() {
            let today = Local::now().date_naive();
            if let Err(err) = self.scores.accept(&name, score, today) {
                tracing::warn!("failed to persist high scores: {err:#}");
            }
        }
    }

    fn dismiss_prompt(&mut self) {
        self.name_entry = None;
        self.candidate_score = None;
    }

    fn reset_game(&mut self) {
        self.engine.reset();
        self.check_at = None;
        self.dismiss_prompt();
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
