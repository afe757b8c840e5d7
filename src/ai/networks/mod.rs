mod activation;
mod feed_forward;

pub use activation::Activation;
pub use feed_forward::{FeedForwardNetwork, NetworkConfig, Parameters};
