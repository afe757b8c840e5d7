use crossterm::event::{self, Event, KeyCode, KeyEvent};
use ratatui::{backend::Backend, Terminal};
use std::io;

use crate::ai::NetworkAgent;
use crate::game::{BoardView, Game, GameConfig, GuessOutcome, MoveError};

/// Interactive single-player game. A trained network, when available,
/// can suggest the next cell.
pub struct App {
    game: Game,
    cursor: (usize, usize),
    hint_agent: Option<NetworkAgent>,
    should_quit: bool,
    message: Option<String>,
}

impl App {
    pub fn new(config: GameConfig, hint_agent: Option<NetworkAgent>) -> Self {
        let cursor = (config.rows / 2, config.cols / 2);
        App {
            game: Game::new(config),
            cursor,
            hint_agent,
            should_quit: false,
            message: None,
        }
    }

    /// Main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            self.handle_events()?;
        }
        Ok(())
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Clear message on any key press
        self.message = None;
        let (row, col) = self.cursor;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up => self.cursor.0 = row.saturating_sub(1),
            KeyCode::Down => self.cursor.0 = (row + 1).min(self.game.rows() - 1),
            KeyCode::Left => self.cursor.1 = col.saturating_sub(1),
            KeyCode::Right => self.cursor.1 = (col + 1).min(self.game.cols() - 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.reveal(),
            KeyCode::Char('h') => self.hint(),
            KeyCode::Char('r') => {
                self.game.restart();
                self.message = Some("New game started!".to_string());
            }
            _ => {}
        }
    }

    fn reveal(&mut self) {
        let (row, col) = self.cursor;
        self.message = match self.game.make_guess(row, col) {
            Ok(GuessOutcome::Won) => Some("All safe cells revealed. You win!".to_string()),
            Ok(GuessOutcome::Lost) => Some("That was a mine. Press 'r' to restart.".to_string()),
            Ok(GuessOutcome::AlreadyRevealed) => Some("Already revealed.".to_string()),
            Ok(GuessOutcome::Revealed { .. }) => None,
            Err(MoveError::GameOver) => Some("Game over! Press 'r' to restart.".to_string()),
            Err(e @ MoveError::OutOfBounds { .. }) => Some(e.to_string()),
        };
    }

    /// Move the cursor to the network's pick.
    fn hint(&mut self) {
        let Some(agent) = self.hint_agent.as_mut() else {
            self.message = Some("No trained parameters loaded.".to_string());
            return;
        };
        if !self.game.is_running() {
            return;
        }
        self.message = match agent.select(&self.game) {
            Ok(Some(cell)) => {
                self.cursor = cell;
                let idx = cell.0 * self.game.cols() + cell.1;
                Some(format!(
                    "Network suggests ({}, {}) with score {:.3}",
                    cell.0,
                    cell.1,
                    agent.prediction()[idx]
                ))
            }
            Ok(None) => Some("No suggestion.".to_string()),
            Err(e) => Some(format!("Hint failed: {e}")),
        };
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        super::game_view::render(
            frame,
            &self.game.snapshot(),
            self.cursor,
            &self.message,
            self.hint_agent.is_some(),
        );
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(GameConfig::default(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let mut app = App::default();
        for _ in 0..10 {
            press(&mut app, KeyCode::Up);
            press(&mut app, KeyCode::Left);
        }
        assert_eq!(app.cursor, (0, 0));
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.cursor, (5, 5));
    }

    #[test]
    fn test_reveal_and_quit() {
        let mut app = App::default();
        press(&mut app, KeyCode::Enter);
        assert!(app.game.visible_count() > 0);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_hint_without_agent() {
        let mut app = App::default();
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.message.as_deref(), Some("No trained parameters loaded."));
    }
}
