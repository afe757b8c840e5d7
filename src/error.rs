use std::path::PathBuf;

use crate::game::MoveError;

/// Errors raised by the feed-forward network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid network shape: {0}")]
    InvalidShape(String),

    #[error("input vector has length {found}, expected {expected}")]
    InputLength { expected: usize, found: usize },

    #[error("target vector has length {found}, expected {expected}")]
    TargetLength { expected: usize, found: usize },

    #[error("backpropagation requested before any forward pass")]
    NoForwardPass,

    #[error("parameter shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("training diverged: non-finite parameter in layer {layer}")]
    Diverged { layer: usize },
}

/// Errors that can occur while reading or writing persisted parameters.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to read parameters from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse parameters from {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stored parameters do not fit the network: {0}")]
    Shape(#[from] NetworkError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that stop the self-play loop.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("move rejected by the board: {0}")]
    Move(#[from] MoveError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = NetworkError::InputLength {
            expected: 324,
            found: 36,
        };
        assert_eq!(
            err.to_string(),
            "input vector has length 36, expected 324"
        );
    }

    #[test]
    fn test_diverged_display() {
        let err = NetworkError::Diverged { layer: 2 };
        assert_eq!(
            err.to_string(),
            "training diverged: non-finite parameter in layer 2"
        );
    }

    #[test]
    fn test_training_error_wraps_network_error() {
        let err: TrainingError = NetworkError::NoForwardPass.into();
        assert_eq!(
            err.to_string(),
            "network error: backpropagation requested before any forward pass"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("network.learning_rate must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: network.learning_rate must be > 0"
        );
    }
}
