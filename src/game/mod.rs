//! Minesweeper board engine: mine layout generation, cascading reveals, and
//! win/loss detection behind a read-only `BoardView`.

mod board;
mod state;

pub use board::{neighbors, Minefield, DEFAULT_COLS, DEFAULT_ROWS};
pub use state::{
    BoardSnapshot, BoardView, Game, GameConfig, GameResult, GuessOutcome, MoveError,
};
