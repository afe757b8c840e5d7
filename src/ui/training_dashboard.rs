use std::collections::VecDeque;

use crate::game::GameResult;
use crate::training::dashboard_msg::{MetricsSnapshot, TickSnapshot, TrainingUpdate};

const MAX_HISTORY: usize = 500;

/// Status of the training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    Running,
    Paused,
    Finished,
    Diverged,
}

/// Dashboard state holding history buffers and current values.
pub struct DashboardState {
    // History buffers: (games played, value)
    pub win_rate_history: VecDeque<(f64, f64)>,
    pub error_history: VecDeque<(f64, f64)>,
    pub game_length_history: VecDeque<u64>,

    // Current values
    pub games_played: usize,
    /// Session game limit, if any.
    pub max_games: Option<usize>,
    session_start: Option<usize>,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub average_error: f64,
    pub avg_game_length: f64,
    pub forced_restarts: usize,
    pub games_per_sec: f64,

    // Live game
    pub live: Option<TickSnapshot>,
    pub last_result: Option<GameResult>,

    // Status
    pub status: TrainingStatus,
    pub last_save: Option<String>,
    pub last_message: Option<String>,
}

impl DashboardState {
    pub fn new(max_games: Option<usize>) -> Self {
        DashboardState {
            win_rate_history: VecDeque::new(),
            error_history: VecDeque::new(),
            game_length_history: VecDeque::new(),

            games_played: 0,
            max_games,
            session_start: None,
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            average_error: 0.0,
            avg_game_length: 0.0,
            forced_restarts: 0,
            games_per_sec: 0.0,

            live: None,
            last_result: None,

            status: TrainingStatus::Running,
            last_save: None,
            last_message: None,
        }
    }

    /// Fold one message from the training thread into the dashboard.
    pub fn apply_update(&mut self, update: TrainingUpdate) {
        match update {
            TrainingUpdate::Tick(tick) => {
                self.session_start.get_or_insert(tick.game_number - 1);
                self.live = Some(tick);
            }
            TrainingUpdate::GameFinished {
                result, metrics, ..
            } => {
                self.last_result = Some(result);
                self.apply_metrics(&metrics);
            }
            TrainingUpdate::ParametersSaved { games_played, path } => {
                self.last_save = Some(format!("game {} ({})", games_played, path.display()));
            }
            TrainingUpdate::Anomaly(message) => {
                self.last_message = Some(message);
            }
            TrainingUpdate::Diverged(message) => {
                self.status = TrainingStatus::Diverged;
                self.last_message = Some(message);
            }
            TrainingUpdate::Finished => {
                if self.status != TrainingStatus::Diverged {
                    self.status = TrainingStatus::Finished;
                }
            }
        }
    }

    /// Apply a metrics snapshot from the training thread.
    pub fn apply_metrics(&mut self, snap: &MetricsSnapshot) {
        self.games_played = snap.games_played;
        self.wins = snap.wins;
        self.losses = snap.losses;
        self.win_rate = snap.win_rate;
        self.average_error = snap.average_error;
        self.avg_game_length = snap.average_game_length;
        self.forced_restarts = snap.forced_restarts;
        self.games_per_sec = snap.games_per_sec;

        let x = snap.games_played as f64;
        self.win_rate_history.push_back((x, snap.win_rate));
        if self.win_rate_history.len() > MAX_HISTORY {
            self.win_rate_history.pop_front();
        }

        self.error_history.push_back((x, snap.average_error));
        if self.error_history.len() > MAX_HISTORY {
            self.error_history.pop_front();
        }

        self.game_length_history
            .push_back(snap.average_game_length.round() as u64);
        if self.game_length_history.len() > MAX_HISTORY {
            self.game_length_history.pop_front();
        }
    }

    /// Games finished since the dashboard started watching.
    pub fn session_games(&self) -> usize {
        self.games_played
            .saturating_sub(self.session_start.unwrap_or(self.games_played))
    }

    /// Progress ratio [0.0, 1.0] toward the session limit, if there is one.
    pub fn progress(&self) -> Option<f64> {
        match self.max_games {
            Some(0) | None => None,
            Some(max) => Some((self.session_games() as f64 / max as f64).min(1.0)),
        }
    }
}
