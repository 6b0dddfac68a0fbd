use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Command, Direction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Game(Command),
    Quit,
    None,
}

/// Actions available while the name entry prompt is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameEntryAction {
    Push(char),
    Pop,
    Submit,
    Skip,
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Movement - Arrow keys
            KeyCode::Up => KeyAction::Game(Command::Steer(Direction::Up)),
            KeyCode::Down => KeyAction::Game(Command::Steer(Direction::Down)),
            KeyCode::Left => KeyAction::Game(Command::Steer(Direction::Left)),
            KeyCode::Right => KeyAction::Game(Command::Steer(Direction::Right)),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => {
                KeyAction::Game(Command::Steer(Direction::Up))
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                KeyAction::Game(Command::Steer(Direction::Down))
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                KeyAction::Game(Command::Steer(Direction::Left))
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                KeyAction::Game(Command::Steer(Direction::Right))
            }

            // Controls
            KeyCode::Enter => KeyAction::Game(Command::Start),
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                KeyAction::Game(Command::TogglePause)
            }
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Game(Command::Reset),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,

            _ => KeyAction::None,
        }
    }

    /// Key mapping in effect while the name entry prompt is open
    pub fn handle_name_entry_key(&self, key: KeyEvent) -> NameEntryAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return NameEntryAction::Quit;
        }

        match key.code {
            KeyCode::Enter => NameEntryAction::Submit,
            KeyCode::Esc => NameEntryAction::Skip,
            KeyCode::Backspace => NameEntryAction::Pop,
            KeyCode::Char(c) => NameEntryAction::Push(c),
            _ => NameEntryAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
