use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::board::{neighbors, Minefield, DEFAULT_COLS, DEFAULT_ROWS};

/// Upper bound on layout redraws while looking for a safe opening.
const MAX_OPENING_ATTEMPTS: usize = 1000;

/// Board generation settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Independent per-cell probability of placing a mine.
    pub mine_probability: f64,
    /// Redraw the layout while the first guess would hit a mine or open
    /// fewer than `min_opening_cells` cells.
    pub safe_opening: bool,
    pub min_opening_cells: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            mine_probability: 0.15,
            safe_opening: true,
            min_opening_cells: 13,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GameResult {
    Running,
    Won,
    Lost,
}

/// What a single guess did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The cell was already visible; nothing changed.
    AlreadyRevealed,
    /// The guess opened `cells` new cells and the game continues.
    Revealed { cells: usize },
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} board")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("game is over")]
    GameOver,
}

/// Read-only view of the player-visible board.
///
/// Mine positions are deliberately absent: anything that only holds a
/// `BoardView` cannot peek at the ground truth.
pub trait BoardView {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    fn is_visible(&self, row: usize, col: usize) -> bool;
    /// Adjacent-mine count; only meaningful for visible cells.
    fn adjacent_mines(&self, row: usize, col: usize) -> u8;
    fn last_move(&self) -> Option<(usize, usize)>;
    fn result(&self) -> GameResult;

    fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Hidden cell 8-adjacent to at least one visible cell.
    fn is_margin(&self, row: usize, col: usize) -> bool {
        !self.is_visible(row, col)
            && neighbors(self.rows(), self.cols(), row, col).any(|(r, c)| self.is_visible(r, c))
    }

    fn visible_count(&self) -> usize {
        let cols = self.cols();
        (0..self.cell_count())
            .filter(|&i| self.is_visible(i / cols, i % cols))
            .count()
    }
}

/// Immutable copy of a board, safe to hand to another thread.
///
/// `mines` is only populated once the game has ended.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub visible: Vec<bool>,
    pub counts: Vec<u8>,
    pub mines: Option<Vec<bool>>,
    pub last_move: Option<(usize, usize)>,
    pub result: GameResult,
}

impl BoardSnapshot {
    pub fn shows_mine(&self, row: usize, col: usize) -> bool {
        self.mines
            .as_ref()
            .is_some_and(|m| m[row * self.cols + col])
    }
}

impl BoardView for BoardSnapshot {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn is_visible(&self, row: usize, col: usize) -> bool {
        self.visible[row * self.cols + col]
    }

    fn adjacent_mines(&self, row: usize, col: usize) -> u8 {
        self.counts[row * self.cols + col]
    }

    fn last_move(&self) -> Option<(usize, usize)> {
        self.last_move
    }

    fn result(&self) -> GameResult {
        self.result
    }
}

/// A single Minesweeper game with mutable reveal state.
pub struct Game {
    config: GameConfig,
    field: Minefield,
    visible: Vec<bool>,
    last_move: Option<(usize, usize)>,
    result: GameResult,
    first_move: bool,
    /// False for fixed layouts: restarts reuse the same mines.
    generated: bool,
    rng: StdRng,
}

impl Game {
    /// Start a game on a freshly generated layout.
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Start a game whose layouts are drawn from a seeded generator.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, mut rng: StdRng) -> Self {
        let field = Minefield::generate(config.rows, config.cols, config.mine_probability, &mut rng);
        Game {
            visible: vec![false; config.rows * config.cols],
            config,
            field,
            last_move: None,
            result: GameResult::Running,
            first_move: true,
            generated: true,
            rng,
        }
    }

    /// Play on a fixed layout. The layout is never redrawn.
    pub fn with_layout(field: Minefield) -> Self {
        let config = GameConfig {
            rows: field.rows(),
            cols: field.cols(),
            safe_opening: false,
            ..GameConfig::default()
        };
        Game {
            visible: vec![false; config.rows * config.cols],
            config,
            field,
            last_move: None,
            result: GameResult::Running,
            first_move: true,
            generated: false,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Start the next game: hide everything and draw a new layout.
    pub fn restart(&mut self) {
        if self.generated {
            self.field = Minefield::generate(
                self.config.rows,
                self.config.cols,
                self.config.mine_probability,
                &mut self.rng,
            );
        }
        self.visible.fill(false);
        self.last_move = None;
        self.result = GameResult::Running;
        self.first_move = true;
    }

    pub fn is_running(&self) -> bool {
        self.result == GameResult::Running
    }

    /// Ground truth, for reward shaping only.
    pub fn is_mine(&self, row: usize, col: usize) -> bool {
        self.field.is_mine(row, col)
    }

    pub fn field(&self) -> &Minefield {
        &self.field
    }

    /// True when exactly the non-mine cells are visible.
    pub fn is_win(&self) -> bool {
        (0..self.cell_count()).all(|i| self.visible[i] != self.field_mine(i))
    }

    fn field_mine(&self, idx: usize) -> bool {
        self.field.is_mine(idx / self.config.cols, idx % self.config.cols)
    }

    /// Reveal a cell, cascading over zero regions.
    pub fn make_guess(&mut self, row: usize, col: usize) -> Result<GuessOutcome, MoveError> {
        let (rows, cols) = (self.config.rows, self.config.cols);
        if row >= rows || col >= cols {
            return Err(MoveError::OutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }
        if !self.is_running() {
            return Err(MoveError::GameOver);
        }
        let idx = row * cols + col;
        if self.visible[idx] {
            return Ok(GuessOutcome::AlreadyRevealed);
        }

        if self.first_move && self.generated && self.config.safe_opening {
            self.ensure_safe_opening(row, col);
        }
        self.first_move = false;

        let cells = self.field.reveal(row, col, &mut self.visible);
        self.last_move = Some((row, col));

        if self.field.is_mine(row, col) {
            self.result = GameResult::Lost;
            return Ok(GuessOutcome::Lost);
        }
        if self.is_win() {
            self.result = GameResult::Won;
            return Ok(GuessOutcome::Won);
        }
        Ok(GuessOutcome::Revealed { cells })
    }

    /// Redraw the layout until the opening guess is safe and opens enough cells.
    fn ensure_safe_opening(&mut self, row: usize, col: usize) {
        let mut scratch = vec![false; self.cell_count()];
        for attempt in 0..MAX_OPENING_ATTEMPTS {
            if !self.field.is_mine(row, col) {
                scratch.fill(false);
                let opened = self.field.reveal(row, col, &mut scratch);
                let wins = opened + self.field.mine_count() == self.cell_count();
                if opened >= self.config.min_opening_cells || wins {
                    if attempt > 0 {
                        debug!("safe opening found after {attempt} redraws");
                    }
                    return;
                }
            }
            self.field = Minefield::generate(
                self.config.rows,
                self.config.cols,
                self.config.mine_probability,
                &mut self.rng,
            );
        }
        debug!("no safe opening within {MAX_OPENING_ATTEMPTS} redraws, keeping last layout");
    }

    /// Copy the board for an observer. Mines are included once the game is over.
    pub fn snapshot(&self) -> BoardSnapshot {
        let (rows, cols) = (self.config.rows, self.config.cols);
        let counts = (0..rows * cols)
            .map(|i| self.field.adjacent_mines(i / cols, i % cols))
            .collect();
        let mines = (!self.is_running())
            .then(|| (0..rows * cols).map(|i| self.field_mine(i)).collect());
        BoardSnapshot {
            rows,
            cols,
            visible: self.visible.clone(),
            counts,
            mines,
            last_move: self.last_move,
            result: self.result,
        }
    }
}

impl BoardView for Game {
    fn rows(&self) -> usize {
        self.config.rows
    }

    fn cols(&self) -> usize {
        self.config.cols
    }

    fn is_visible(&self, row: usize, col: usize) -> bool {
        self.visible[row * self.config.cols + col]
    }

    fn adjacent_mines(&self, row: usize, col: usize) -> u8 {
        self.field.adjacent_mines(row, col)
    }

    fn last_move(&self) -> Option<(usize, usize)> {
        self.last_move
    }

    fn result(&self) -> GameResult {
        self.result
    }
}
