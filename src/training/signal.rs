use crate::game::{BoardView, Game, GameResult};

/// Per-cell target for one backpropagation step.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSignal {
    /// One entry per cell, row-major.
    pub target: Vec<f64>,
    /// Indices of the margin squares at build time.
    pub margin: Vec<usize>,
    /// How many consecutive backpropagation steps to apply.
    pub repeat_count: usize,
    pub result: GameResult,
}

impl TrainingSignal {
    pub fn is_loss(&self) -> bool {
        self.result == GameResult::Lost
    }
}

/// Turns the board after a move into the vector the network is pushed toward.
///
/// 1. revealed cells get 0
/// 2. margin squares share a uniform 1 / |margin|
/// 3. the last move gets 1 unless it was already reinforced this game
/// 4. on a loss the last move is forced to 0 and the margin mass moves onto
///    the margin squares that are not mines
///
/// The only state kept across ticks is the set of cells reinforced so far in
/// the current game. It is cleared whenever the builder sees a finished board.
#[derive(Debug, Clone)]
pub struct TrainingSignalBuilder {
    reinforced: Vec<usize>,
    repeat_count: usize,
    loss_repeat_count: usize,
}

impl TrainingSignalBuilder {
    pub fn new(repeat_count: usize, loss_repeat_count: usize) -> Self {
        TrainingSignalBuilder {
            reinforced: Vec::new(),
            repeat_count,
            loss_repeat_count,
        }
    }

    /// Cells reinforced in the current game, in the order they were added.
    pub fn reinforced(&self) -> &[usize] {
        &self.reinforced
    }

    /// Forget the current game. Called on a forced restart.
    pub fn reset(&mut self) {
        self.reinforced.clear();
    }

    /// Build the target for the board as it stands after the last guess.
    ///
    /// Mine positions are read here and nowhere on the prediction path.
    pub fn build(&mut self, game: &Game) -> TrainingSignal {
        let (rows, cols) = (game.rows(), game.cols());
        let mut target = vec![0.0; rows * cols];

        let margin: Vec<usize> = (0..rows * cols)
            .filter(|&idx| game.is_margin(idx / cols, idx % cols))
            .collect();
        if !margin.is_empty() {
            let share = 1.0 / margin.len() as f64;
            for &idx in &margin {
                target[idx] = share;
            }
        }

        let last = game.last_move().map(|(row, col)| row * cols + col);
        if let Some(idx) = last {
            if !self.reinforced.contains(&idx) {
                target[idx] = 1.0;
                self.reinforced.push(idx);
            }
        }

        let result = game.result();
        let repeat_count = if result == GameResult::Lost {
            if let Some(idx) = last {
                target[idx] = 0.0;
            }
            let safe: Vec<usize> = margin
                .iter()
                .copied()
                .filter(|&idx| !game.is_mine(idx / cols, idx % cols))
                .collect();
            for &idx in &margin {
                target[idx] = 0.0;
            }
            if !safe.is_empty() {
                let share = 1.0 / safe.len() as f64;
                for &idx in &safe {
                    target[idx] = share;
                }
            }
            self.loss_repeat_count
        } else {
            self.repeat_count
        };

        if result != GameResult::Running {
            self.reset();
        }

        TrainingSignal {
            target,
            margin,
            repeat_count,
            result,
        }
    }
}

impl Default for TrainingSignalBuilder {
    fn default() -> Self {
        Self::new(1, 100)
    }
}
