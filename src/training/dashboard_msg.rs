use std::path::PathBuf;

use crate::game::{BoardSnapshot, GameResult};

/// Board and network view after one tick, for the live dashboard.
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    pub board: BoardSnapshot,
    /// Network scores from the forward pass that chose this tick's move.
    pub prediction: Vec<f64>,
    /// Target the network was trained toward on this tick.
    pub target: Vec<f64>,
    pub game_number: usize,
    pub move_number: usize,
}

/// Periodic metrics snapshot sent from training thread to dashboard.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub games_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub average_error: f64,
    pub average_game_length: f64,
    pub forced_restarts: usize,
    pub games_per_sec: f64,
}

/// Updates sent from training thread to UI.
#[derive(Debug, Clone)]
pub enum TrainingUpdate {
    Tick(TickSnapshot),
    GameFinished {
        game_number: usize,
        result: GameResult,
        metrics: MetricsSnapshot,
    },
    ParametersSaved {
        games_played: usize,
        path: PathBuf,
    },
    /// Recoverable runaway, e.g. a forced restart after repeated idle picks.
    Anomaly(String),
    Diverged(String),
    Finished,
}

/// Commands sent from UI to training thread.
#[derive(Debug, Clone)]
pub enum TrainingCommand {
    SaveParameters,
}
