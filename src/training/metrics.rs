use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::GameResult;

/// Outcome of one finished self-play game.
#[derive(Debug, Clone, Copy)]
pub struct GameRecord {
    pub result: GameResult,
    /// Guesses applied, idle picks included.
    pub moves: usize,
}

/// Rolling-window training statistics plus lifetime win/loss counters.
pub struct TrainingMetrics {
    games: VecDeque<GameRecord>,
    errors: VecDeque<f64>,
    capacity: usize,
    // lifetime counts, never capped; restored from checkpoint metadata
    total_games: usize,
    total_wins: usize,
    total_losses: usize,
    forced_restarts: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            games: VecDeque::with_capacity(capacity),
            errors: VecDeque::with_capacity(capacity),
            capacity,
            total_games: 0,
            total_wins: 0,
            total_losses: 0,
            forced_restarts: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Continue lifetime counters from a previous session.
    pub fn restore_totals(&mut self, games: usize, wins: usize, losses: usize) {
        self.total_games = games;
        self.total_wins = wins;
        self.total_losses = losses;
    }

    pub fn record_game(&mut self, record: GameRecord) {
        self.total_games += 1;
        match record.result {
            GameResult::Won => self.total_wins += 1,
            GameResult::Lost => self.total_losses += 1,
            GameResult::Running => {}
        }
        self.games.push_back(record);
        if self.games.len() > self.capacity {
            self.games.pop_front();
        }
    }

    /// Mean squared error between prediction and target for one tick.
    pub fn record_error(&mut self, error: f64) {
        self.errors.push_back(error);
        if self.errors.len() > self.capacity {
            self.errors.pop_front();
        }
    }

    pub fn record_forced_restart(&mut self) {
        self.forced_restarts += 1;
    }

    /// Fraction of the last N games that were won.
    pub fn win_rate(&self, last_n: usize) -> f64 {
        let n = self.games.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self
            .games
            .iter()
            .rev()
            .take(n)
            .filter(|g| g.result == GameResult::Won)
            .count();
        wins as f64 / n as f64
    }

    pub fn average_error(&self, last_n: usize) -> f64 {
        let n = self.errors.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.errors.iter().rev().take(n).sum();
        sum / n as f64
    }

    pub fn average_game_length(&self, last_n: usize) -> f64 {
        let n = self.games.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.games.iter().rev().take(n).map(|g| g.moves).sum();
        total as f64 / n as f64
    }

    pub fn total_games(&self) -> usize {
        self.total_games
    }

    pub fn total_wins(&self) -> usize {
        self.total_wins
    }

    pub fn total_losses(&self) -> usize {
        self.total_losses
    }

    pub fn forced_restarts(&self) -> usize {
        self.forced_restarts
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Game throughput since the last window reset.
pub struct Throughput {
    window_start: Instant,
    window_games: usize,
}

impl Throughput {
    pub fn new() -> Self {
        Throughput {
            window_start: Instant::now(),
            window_games: 0,
        }
    }

    pub fn record_game(&mut self) {
        self.window_games += 1;
    }

    pub fn games_per_sec(&self) -> f64 {
        self.rate_over(self.window_start.elapsed())
    }

    fn rate_over(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.window_games as f64 / secs
    }

    pub fn reset_window(&mut self) {
        self.window_start = Instant::now();
        self.window_games = 0;
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new()
    }
}
