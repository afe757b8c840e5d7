//! Self-play training: the reward-shaping signal builder, the
//! predict/act/learn driver, metrics collection, and dashboard message
//! types for live TUI updates.

pub mod dashboard_msg;
pub mod metrics;
pub mod signal;
pub mod trainer;
