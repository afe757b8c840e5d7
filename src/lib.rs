//! # ML Minesweeper
//!
//! A Minesweeper game paired with a small feed-forward neural network that
//! learns where to click through continuous self-play. The network is
//! evaluated and trained one neuron at a time, with no linear-algebra crate.
//! Features a terminal UI built with Ratatui for both human play and a live
//! training dashboard.
//!
//! ## Modules
//!
//! - [`game`]: Board engine: minefield generation, cascading reveal, win/loss
//! - [`ai`]: Feed-forward network, board encoding, cell-selection agent
//! - [`training`]: Training-signal builder, self-play driver, metrics
//! - [`checkpoint`]: Parameter persistence
//! - [`ui`]: Terminal UI: game view, training dashboard
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
pub mod ui;
