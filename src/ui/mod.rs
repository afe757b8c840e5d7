//! Terminal UI: a game view for playing Minesweeper by hand, and a live
//! training dashboard with charts, stats, and the network's view of the
//! current board.

mod app;
pub mod board_widget;
mod game_view;
pub mod training_dashboard;
pub mod training_view;

pub use app::App;
