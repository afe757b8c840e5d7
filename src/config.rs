use std::path::Path;

use log::warn;

use crate::ai::NetworkConfig;
use crate::checkpoint::ParameterStoreConfig;
use crate::error::ConfigError;
use crate::game::GameConfig;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub network: NetworkConfig,
    pub training: TrainerConfig,
    pub checkpoint: ParameterStoreConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.rows == 0 || self.game.cols == 0 {
            return Err(ConfigError::Validation(
                "game.rows and game.cols must be > 0".into(),
            ));
        }
        if !(self.game.mine_probability > 0.0 && self.game.mine_probability < 1.0) {
            return Err(ConfigError::Validation(
                "game.mine_probability must be in (0, 1)".into(),
            ));
        }
        if self.game.safe_opening && self.game.min_opening_cells > self.game.rows * self.game.cols
        {
            return Err(ConfigError::Validation(
                "game.min_opening_cells cannot exceed the board size".into(),
            ));
        }

        if self.network.hidden_layers == 0 {
            return Err(ConfigError::Validation(
                "network.hidden_layers must be >= 1".into(),
            ));
        }
        if self.network.hidden_width == 0 {
            return Err(ConfigError::Validation(
                "network.hidden_width must be > 0".into(),
            ));
        }
        if !(self.network.learning_rate > 0.0 && self.network.learning_rate.is_finite()) {
            return Err(ConfigError::Validation(
                "network.learning_rate must be a positive finite number".into(),
            ));
        }

        if self.training.repeat_count == 0 {
            return Err(ConfigError::Validation(
                "training.repeat_count must be >= 1".into(),
            ));
        }
        if self.training.loss_repeat_count == 0 {
            return Err(ConfigError::Validation(
                "training.loss_repeat_count must be >= 1".into(),
            ));
        }
        if self.training.max_idle_picks == 0 {
            return Err(ConfigError::Validation(
                "training.max_idle_picks must be >= 1".into(),
            ));
        }
        if self.training.save_every_games == 0 {
            return Err(ConfigError::Validation(
                "training.save_every_games must be > 0".into(),
            ));
        }
        if self.training.max_games == Some(0) {
            return Err(ConfigError::Validation(
                "training.max_games must be > 0 when set".into(),
            ));
        }

        if self.checkpoint.parameters_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "checkpoint.parameters_path must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Activation, SelectionPolicy};
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = AppConfig::default();
        assert_eq!((config.game.rows, config.game.cols), (6, 6));
        assert_eq!(config.network.hidden_layers, 2);
        assert_eq!(config.network.hidden_width, 13);
        assert!((config.network.learning_rate - 0.08).abs() < 1e-12);
        assert_eq!(config.training.loss_repeat_count, 100);
        assert_eq!(config.training.max_idle_picks, 5);
        assert_eq!(config.training.save_every_games, 10);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[network]
learning_rate = 0.02
activation = "identity"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!((config.network.learning_rate - 0.02).abs() < 1e-12);
        assert_eq!(config.network.activation, Activation::Identity);
        // Other fields should be defaults
        assert_eq!(config.network.hidden_width, 13);
        assert_eq!(config.training.selection, SelectionPolicy::Frontier);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert_eq!(config.game.rows, default.game.rows);
        assert_eq!(config.training.repeat_count, default.training.repeat_count);
        assert_eq!(
            config.checkpoint.parameters_path,
            default.checkpoint.parameters_path
        );
    }

    #[test]
    fn test_validation_rejects_zero_board() {
        let mut config = AppConfig::default();
        config.game.cols = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_mine_probability_out_of_range() {
        let mut config = AppConfig::default();
        config.game.mine_probability = 1.0;
        assert!(config.validate().is_err());
        config.game.mine_probability = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_oversized_opening() {
        let mut config = AppConfig::default();
        config.game.min_opening_cells = 37;
        assert!(config.validate().is_err());
        config.game.safe_opening = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_positive_lr() {
        let mut config = AppConfig::default();
        config.network.learning_rate = 0.0;
        assert!(config.validate().is_err());
        config.network.learning_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_hidden_layers() {
        let mut config = AppConfig::default();
        config.network.hidden_layers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_repeat_counts() {
        let mut config = AppConfig::default();
        config.training.repeat_count = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.training.loss_repeat_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_save_interval() {
        let mut config = AppConfig::default();
        config.training.save_every_games = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_max_games() {
        let mut config = AppConfig::default();
        config.training.max_games = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training.save_every_games, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
max_games = 500
selection = "unrestricted"
seed = 7
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.max_games, Some(500));
        assert_eq!(config.training.selection, SelectionPolicy::Unrestricted);
        assert_eq!(config.training.seed, Some(7));
        // Others are defaults
        assert_eq!(config.game.rows, 6);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[game]\nmine_probability = 2.0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }
}
