use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};

use ml_minesweeper::ai::state_encoding::input_size;
use ml_minesweeper::ai::{FeedForwardNetwork, NetworkAgent};
use ml_minesweeper::checkpoint::ParameterStore;
use ml_minesweeper::config::AppConfig;
use ml_minesweeper::ui::App;

/// Play Minesweeper in the terminal.
#[derive(Parser)]
#[command(name = "ml_minesweeper", about = "Play Minesweeper with optional network hints")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    config.validate().context("validating configuration")?;
    let hint_agent = load_hint_agent(&config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.game.clone(), hint_agent);
    let res = app.run(&mut terminal);

    // Restore terminal, even on error
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    res.context("running game")
}

/// Stored parameters that fit the configured board, if any.
fn load_hint_agent(config: &AppConfig) -> Option<NetworkAgent> {
    let (rows, cols) = (config.game.rows, config.game.cols);
    let store = ParameterStore::new(config.checkpoint.clone());
    let stored = match store.load() {
        Ok(Some(stored)) => stored,
        Ok(None) => return None,
        Err(e) => {
            warn!("hints disabled: {e}");
            return None;
        }
    };

    let mut network =
        FeedForwardNetwork::from_config(input_size(rows, cols), rows * cols, &config.network)
            .ok()?;
    if let Err(e) = network.load_parameters(&stored.parameters) {
        warn!("hints disabled: {e}");
        return None;
    }
    info!("hints enabled from {}", store.parameters_path().display());
    Some(NetworkAgent::new(network, config.training.selection))
}
