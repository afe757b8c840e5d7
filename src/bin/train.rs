use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use ml_minesweeper::config::AppConfig;
use ml_minesweeper::training::dashboard_msg::{TrainingCommand, TrainingUpdate};
use ml_minesweeper::training::trainer::SelfPlayDriver;
use ml_minesweeper::ui::training_dashboard::{DashboardState, TrainingStatus};
use ml_minesweeper::ui::training_view;

/// Pace of the live dashboard when neither the config nor the CLI sets one.
const DASHBOARD_TICK_MS: u64 = 500;

/// Train the Minesweeper network via continuous self-play.
#[derive(Parser)]
#[command(name = "train", about = "Train the Minesweeper network by self-play")]
struct Cli {
    /// Run in headless mode (log output, no TUI dashboard)
    #[arg(long)]
    headless: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Stop after this many games
    #[arg(long)]
    games: Option<usize>,

    /// Delay between ticks in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Ignore stored parameters and start from a fresh network
    #[arg(long)]
    fresh: bool,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Log file used while the dashboard owns the terminal
    #[arg(long, default_value = "train.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    // Load configuration
    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(games) = cli.games {
        app_config.training.max_games = Some(games);
    }
    if let Some(lr) = cli.lr {
        app_config.network.learning_rate = lr;
    }
    match cli.tick_ms {
        Some(ms) => app_config.training.tick_delay_ms = ms,
        None if !cli.headless && app_config.training.tick_delay_ms == 0 => {
            app_config.training.tick_delay_ms = DASHBOARD_TICK_MS;
        }
        None => {}
    }
    app_config.validate().context("validating configuration")?;

    let driver = SelfPlayDriver::new(&app_config, cli.fresh).context("preparing self-play")?;

    if cli.headless {
        let quit = Arc::new(AtomicBool::new(false));
        let handler_quit = quit.clone();
        ctrlc::set_handler(move || {
            info!("interrupted, stopping after the current tick");
            handler_quit.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;

        let mut driver = driver;
        driver.train(&quit).context("self-play training")?;
        Ok(())
    } else {
        run_dashboard(driver, app_config.training.max_games)
    }
}

/// Headless runs log to stderr; the dashboard owns the terminal, so its log
/// output goes to a file instead.
fn init_logging(cli: &Cli) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if !cli.headless {
        let file = std::fs::File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run_dashboard(driver: SelfPlayDriver, max_games: Option<usize>) -> Result<()> {
    let (update_tx, update_rx) = mpsc::channel::<TrainingUpdate>();
    let (cmd_tx, cmd_rx) = mpsc::channel::<TrainingCommand>();

    let pause = Arc::new(AtomicBool::new(false));
    let quit = Arc::new(AtomicBool::new(false));

    let pause_clone = pause.clone();
    let quit_clone = quit.clone();

    let training_handle = std::thread::spawn(move || {
        let mut driver = driver;
        driver.train_with_dashboard(update_tx, cmd_rx, pause_clone, quit_clone)
    });

    let ui_result = run_dashboard_ui(update_rx, cmd_tx, pause, quit.clone(), max_games);
    // Make sure the training thread winds down even if the UI failed.
    quit.store(true, Ordering::Relaxed);

    let training_result = training_handle
        .join()
        .map_err(|_| anyhow::anyhow!("training thread panicked"))?;
    ui_result?;
    training_result.context("self-play training")?;
    info!("dashboard closed");
    Ok(())
}

fn run_dashboard_ui(
    update_rx: mpsc::Receiver<TrainingUpdate>,
    cmd_tx: mpsc::Sender<TrainingCommand>,
    pause: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
    max_games: Option<usize>,
) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    let mut dashboard = DashboardState::new(max_games);
    let frame_duration = Duration::from_millis(100);

    let result = (|| -> Result<()> {
        loop {
            while let Ok(update) = update_rx.try_recv() {
                dashboard.apply_update(update);
            }

            terminal
                .draw(|f| training_view::render(f, &dashboard))
                .context("drawing dashboard")?;

            if event::poll(frame_duration).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => {
                            quit.store(true, Ordering::Relaxed);
                            return Ok(());
                        }
                        KeyCode::Char('p') | KeyCode::Char('P')
                            if matches!(
                                dashboard.status,
                                TrainingStatus::Running | TrainingStatus::Paused
                            ) =>
                        {
                            let was_paused = pause.load(Ordering::Relaxed);
                            pause.store(!was_paused, Ordering::Relaxed);
                            dashboard.status = if was_paused {
                                TrainingStatus::Running
                            } else {
                                TrainingStatus::Paused
                            };
                        }
                        KeyCode::Char('s') | KeyCode::Char('S') => {
                            let _ = cmd_tx.send(TrainingCommand::SaveParameters);
                        }
                        _ => {}
                    }
                }
            }
            // Once finished the final state stays up until the user presses q.
        }
    })();

    // Terminal cleanup; errors here are ignored
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
    result
}
