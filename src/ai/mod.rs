mod agent;
pub mod networks;
pub mod state_encoding;

pub use agent::{select_cell, NetworkAgent, SelectionPolicy};
pub use networks::{Activation, FeedForwardNetwork, NetworkConfig, Parameters};
