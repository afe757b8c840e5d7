use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::state_encoding::input_size;
use crate::ai::{FeedForwardNetwork, NetworkAgent, SelectionPolicy};
use crate::checkpoint::{CheckpointMetadata, ParameterStore};
use crate::config::AppConfig;
use crate::error::{CheckpointError, NetworkError, TrainingError};
use crate::game::{BoardSnapshot, BoardView, Game, GameResult, GuessOutcome};
use crate::training::dashboard_msg::{
    MetricsSnapshot, TickSnapshot, TrainingCommand, TrainingUpdate,
};
use crate::training::metrics::{GameRecord, Throughput, TrainingMetrics};
use crate::training::signal::{TrainingSignal, TrainingSignalBuilder};

/// Self-play loop settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Backpropagation steps per ordinary tick.
    pub repeat_count: usize,
    /// Backpropagation steps on the tick that lost the game.
    pub loss_repeat_count: usize,
    /// Consecutive already-revealed picks still played; one more restarts the game.
    pub max_idle_picks: usize,
    /// Sleep after every tick so an observer can follow along.
    pub tick_delay_ms: u64,
    pub save_every_games: usize,
    /// Games between headless progress summaries.
    pub log_interval: usize,
    pub selection: SelectionPolicy,
    /// Stop after this many games in the current session; run forever if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_games: Option<usize>,
    /// Seed for board generation and fresh network weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            repeat_count: 1,
            loss_repeat_count: 100,
            max_idle_picks: 5,
            tick_delay_ms: 0,
            save_every_games: 10,
            log_interval: 100,
            selection: SelectionPolicy::Frontier,
            max_games: None,
            seed: None,
        }
    }
}

/// What a tick did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The guess was applied and learned from; the game goes on.
    Played(GuessOutcome),
    /// The guess ended the game. A new game has already started.
    Finished(GameResult),
    /// Too many idle picks, or nothing to pick. The game was restarted
    /// without applying a move or learning.
    ForcedRestart,
}

/// Everything an observer may want to know about one tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub pick: Option<(usize, usize)>,
    pub outcome: TickOutcome,
    /// Board right after the move, before any restart.
    pub board: BoardSnapshot,
    pub signal: Option<TrainingSignal>,
    /// Squared error of this tick's prediction against its target.
    pub error: Option<f64>,
    /// Set when this tick triggered a periodic save that succeeded.
    pub saved: Option<PathBuf>,
}

/// Runs predict → act → learn over successive games.
///
/// The driver owns the game, the network and the signal builder outright;
/// observers only ever see the snapshots it hands out.
pub struct SelfPlayDriver {
    config: TrainerConfig,
    learning_rate: f64,
    game: Game,
    agent: NetworkAgent,
    signal: TrainingSignalBuilder,
    store: ParameterStore,
    metrics: TrainingMetrics,
    throughput: Throughput,
    idle_picks: usize,
    moves_this_game: usize,
    games_since_save: usize,
    session_games: usize,
}

impl SelfPlayDriver {
    /// Build a driver from the application config. Stored parameters are
    /// loaded unless `fresh` is set; when none exist, the fresh parameters
    /// are written right away so the file exists from the first run.
    pub fn new(config: &AppConfig, fresh: bool) -> Result<Self, TrainingError> {
        let game_config = config.game.clone();
        let (rows, cols) = (game_config.rows, game_config.cols);
        let seed = config.training.seed;

        let game = match seed {
            Some(seed) => Game::with_seed(game_config, seed),
            None => Game::new(game_config),
        };
        let network = match seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
                FeedForwardNetwork::with_rng(
                    input_size(rows, cols),
                    rows * cols,
                    config.network.hidden_layers,
                    config.network.hidden_width,
                    config.network.activation,
                    &mut rng,
                )?
            }
            None => FeedForwardNetwork::from_config(
                input_size(rows, cols),
                rows * cols,
                &config.network,
            )?,
        };
        let agent = NetworkAgent::new(network, config.training.selection);
        let store = ParameterStore::new(config.checkpoint.clone());

        let mut driver = Self::with_parts(
            config.training.clone(),
            config.network.learning_rate,
            game,
            agent,
            store,
        );

        let stored = if fresh { None } else { driver.store.load()? };
        match stored {
            Some(stored) => {
                driver
                    .agent
                    .network_mut()
                    .load_parameters(&stored.parameters)
                    .map_err(CheckpointError::Shape)?;
                if let Some(meta) = stored.metadata {
                    driver
                        .metrics
                        .restore_totals(meta.games_played, meta.wins, meta.losses);
                }
                info!(
                    "loaded parameters from {} ({} games played so far)",
                    driver.store.parameters_path().display(),
                    driver.metrics.total_games()
                );
            }
            None => {
                info!(
                    "starting from fresh parameters, layers {:?}",
                    driver.agent.network().layer_widths()
                );
                driver.save_or_warn();
            }
        }
        Ok(driver)
    }

    /// Assemble a driver from ready-made pieces without touching the disk.
    pub fn with_parts(
        config: TrainerConfig,
        learning_rate: f64,
        game: Game,
        agent: NetworkAgent,
        store: ParameterStore,
    ) -> Self {
        let signal = TrainingSignalBuilder::new(config.repeat_count, config.loss_repeat_count);
        SelfPlayDriver {
            config,
            learning_rate,
            game,
            agent,
            signal,
            store,
            metrics: TrainingMetrics::new(),
            throughput: Throughput::new(),
            idle_picks: 0,
            moves_this_game: 0,
            games_since_save: 0,
            session_games: 0,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn agent(&self) -> &NetworkAgent {
        &self.agent
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn signal_builder(&self) -> &TrainingSignalBuilder {
        &self.signal
    }

    /// Games completed since this driver was built.
    pub fn session_games(&self) -> usize {
        self.session_games
    }

    /// Run one predict → act → learn cycle.
    pub fn tick(&mut self) -> Result<TickReport, TrainingError> {
        let pick = self.agent.select(&self.game)?;

        let (row, col) = match pick {
            Some((row, col)) if !self.game.is_visible(row, col) => {
                self.idle_picks = 0;
                (row, col)
            }
            // Already revealed: still played and learned from, up to the limit.
            Some(cell) if self.idle_picks < self.config.max_idle_picks => {
                self.idle_picks += 1;
                cell
            }
            _ => {
                self.idle_picks += 1;
                return Ok(self.force_restart(pick));
            }
        };

        let guess = self.game.make_guess(row, col)?;
        self.moves_this_game += 1;

        let signal = self.signal.build(&self.game);
        let error = self.agent.network().mean_squared_error(&signal.target)?;
        self.learn(&signal)?;
        self.metrics.record_error(error);
        debug!(
            "game {} move {}: ({row}, {col}) -> {guess:?}, error {error:.5}",
            self.metrics.total_games() + 1,
            self.moves_this_game
        );

        let board = self.game.snapshot();
        let mut saved = None;
        let outcome = match guess {
            GuessOutcome::Won | GuessOutcome::Lost => {
                let result = self.game.result();
                saved = self.finish_game(result);
                TickOutcome::Finished(result)
            }
            other => TickOutcome::Played(other),
        };

        Ok(TickReport {
            pick,
            outcome,
            board,
            signal: Some(signal),
            error: Some(error),
            saved,
        })
    }

    fn learn(&mut self, signal: &TrainingSignal) -> Result<(), NetworkError> {
        let network = self.agent.network_mut();
        for _ in 0..signal.repeat_count {
            network.apply_backpropagation(&signal.target, self.learning_rate)?;
        }
        Ok(())
    }

    fn force_restart(&mut self, pick: Option<(usize, usize)>) -> TickReport {
        warn!(
            "restarting game after {} idle picks (last pick {pick:?})",
            self.idle_picks
        );
        let board = self.game.snapshot();
        self.metrics.record_forced_restart();
        self.start_next_game();
        TickReport {
            pick,
            outcome: TickOutcome::ForcedRestart,
            board,
            signal: None,
            error: None,
            saved: None,
        }
    }

    /// Book-keep a finished game, save on schedule, and deal a new board.
    fn finish_game(&mut self, result: GameResult) -> Option<PathBuf> {
        self.metrics.record_game(GameRecord {
            result,
            moves: self.moves_this_game,
        });
        self.throughput.record_game();
        self.session_games += 1;
        self.games_since_save += 1;

        let saved = if self.games_since_save >= self.config.save_every_games {
            self.save_or_warn()
        } else {
            None
        };
        self.start_next_game();
        saved
    }

    fn start_next_game(&mut self) {
        self.signal.reset();
        self.game.restart();
        self.idle_picks = 0;
        self.moves_this_game = 0;
    }

    /// Persist the current parameters and training totals.
    pub fn save_parameters(&mut self) -> Result<PathBuf, CheckpointError> {
        let metadata = CheckpointMetadata {
            games_played: self.metrics.total_games(),
            wins: self.metrics.total_wins(),
            losses: self.metrics.total_losses(),
            layer_widths: self.agent.network().layer_widths().to_vec(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        };
        let path = self.store.save(&self.agent.network().parameters(), &metadata)?;
        self.games_since_save = 0;
        Ok(path)
    }

    fn save_or_warn(&mut self) -> Option<PathBuf> {
        match self.save_parameters() {
            Ok(path) => {
                info!(
                    "saved parameters to {} after {} games",
                    path.display(),
                    self.metrics.total_games()
                );
                Some(path)
            }
            Err(e) => {
                warn!("failed to save parameters: {e}");
                None
            }
        }
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let window = self.config.log_interval.max(1);
        MetricsSnapshot {
            games_played: self.metrics.total_games(),
            wins: self.metrics.total_wins(),
            losses: self.metrics.total_losses(),
            win_rate: self.metrics.win_rate(window),
            average_error: self.metrics.average_error(window),
            average_game_length: self.metrics.average_game_length(window),
            forced_restarts: self.metrics.forced_restarts(),
            games_per_sec: self.throughput.games_per_sec(),
        }
    }

    fn reached_game_limit(&self) -> bool {
        self.config
            .max_games
            .is_some_and(|max| self.session_games >= max)
    }

    fn pace(&self) {
        if self.config.tick_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.tick_delay_ms));
        }
    }

    fn log_progress(&mut self) {
        let window = self.config.log_interval.max(1);
        info!(
            "games {} | win/loss {}/{} | win_rate({}): {:.1}% | avg_len: {:.1} | error: {:.5} | {:.1} games/s",
            self.metrics.total_games(),
            self.metrics.total_wins(),
            self.metrics.total_losses(),
            window,
            self.metrics.win_rate(window) * 100.0,
            self.metrics.average_game_length(window),
            self.metrics.average_error(window),
            self.throughput.games_per_sec(),
        );
        self.throughput.reset_window();
    }

    /// Train until `quit` is raised or the game limit is reached. The
    /// parameters are saved once more on the way out.
    pub fn train(&mut self, quit: &AtomicBool) -> Result<(), TrainingError> {
        info!(
            "self-play training on a {}x{} board ({:?} selection, lr {})",
            self.game.rows(),
            self.game.cols(),
            self.config.selection,
            self.learning_rate
        );

        while !quit.load(Ordering::Relaxed) && !self.reached_game_limit() {
            let report = self.tick().inspect_err(log_fatal)?;
            if let TickOutcome::Finished(_) = report.outcome {
                if self.session_games % self.config.log_interval.max(1) == 0 {
                    self.log_progress();
                }
            }
            self.pace();
        }

        self.save_or_warn();
        info!(
            "training stopped after {} games this session ({} total)",
            self.session_games,
            self.metrics.total_games()
        );
        Ok(())
    }

    /// Train while streaming snapshots to a dashboard. Honors pause, quit
    /// and save requests at tick boundaries.
    pub fn train_with_dashboard(
        &mut self,
        tx: Sender<TrainingUpdate>,
        cmd_rx: Receiver<TrainingCommand>,
        pause: Arc<AtomicBool>,
        quit: Arc<AtomicBool>,
    ) -> Result<(), TrainingError> {
        let result = self.dashboard_loop(&tx, &cmd_rx, &pause, &quit);
        match &result {
            Ok(()) => {
                if let Some(path) = self.save_or_warn() {
                    let _ = tx.send(TrainingUpdate::ParametersSaved {
                        games_played: self.metrics.total_games(),
                        path,
                    });
                }
            }
            Err(e) => {
                log_fatal(e);
                let _ = tx.send(TrainingUpdate::Diverged(e.to_string()));
            }
        }
        let _ = tx.send(TrainingUpdate::Finished);
        result
    }

    fn dashboard_loop(
        &mut self,
        tx: &Sender<TrainingUpdate>,
        cmd_rx: &Receiver<TrainingCommand>,
        pause: &AtomicBool,
        quit: &AtomicBool,
    ) -> Result<(), TrainingError> {
        while !quit.load(Ordering::Relaxed) && !self.reached_game_limit() {
            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    TrainingCommand::SaveParameters => {
                        if let Some(path) = self.save_or_warn() {
                            let _ = tx.send(TrainingUpdate::ParametersSaved {
                                games_played: self.metrics.total_games(),
                                path,
                            });
                        }
                    }
                }
            }

            if pause.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }

            let game_number = self.metrics.total_games() + 1;
            let move_number = self.moves_this_game + 1;
            let report = self.tick()?;

            let _ = tx.send(TrainingUpdate::Tick(TickSnapshot {
                board: report.board,
                prediction: self.agent.prediction().to_vec(),
                target: report
                    .signal
                    .map(|s| s.target)
                    .unwrap_or_default(),
                game_number,
                move_number,
            }));
            match report.outcome {
                TickOutcome::Finished(result) => {
                    let _ = tx.send(TrainingUpdate::GameFinished {
                        game_number,
                        result,
                        metrics: self.metrics_snapshot(),
                    });
                }
                TickOutcome::ForcedRestart => {
                    let _ = tx.send(TrainingUpdate::Anomaly(format!(
                        "game {game_number}: restarted after repeated idle picks"
                    )));
                }
                TickOutcome::Played(_) => {}
            }
            if let Some(path) = report.saved {
                let _ = tx.send(TrainingUpdate::ParametersSaved {
                    games_played: self.metrics.total_games(),
                    path,
                });
            }

            self.pace();
        }
        Ok(())
    }
}

fn log_fatal(e: &TrainingError) {
    error!("training halted: {e}");
}
