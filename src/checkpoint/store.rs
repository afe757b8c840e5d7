use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;

use crate::ai::Parameters;
use crate::checkpoint::metadata::CheckpointMetadata;
use crate::error::CheckpointError;

/// Where the parameter file lives.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParameterStoreConfig {
    pub parameters_path: PathBuf,
}

impl Default for ParameterStoreConfig {
    fn default() -> Self {
        ParameterStoreConfig {
            parameters_path: PathBuf::from("network_parameters.json"),
        }
    }
}

/// Parameters read back from disk, with their metadata when it was readable.
#[derive(Debug, Clone)]
pub struct StoredCheckpoint {
    pub parameters: Parameters,
    pub metadata: Option<CheckpointMetadata>,
}

/// Reads and writes the persisted network parameters.
///
/// The parameter file is a JSON object `{"Weights": ..., "Bias": ...}`; the
/// metadata sidecar sits beside it as `<stem>.meta.json`.
pub struct ParameterStore {
    config: ParameterStoreConfig,
}

impl ParameterStore {
    pub fn new(config: ParameterStoreConfig) -> Self {
        ParameterStore { config }
    }

    pub fn parameters_path(&self) -> &Path {
        &self.config.parameters_path
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.config.parameters_path.with_extension("meta.json")
    }

    /// Load stored parameters. A missing parameter file means no prior
    /// training and yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<StoredCheckpoint>, CheckpointError> {
        let path = &self.config.parameters_path;
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CheckpointError::Read {
                    path: path.clone(),
                    source: e,
                })
            }
        };
        let parameters: Parameters =
            serde_json::from_str(&text).map_err(|e| CheckpointError::Parse {
                path: path.clone(),
                source: e,
            })?;

        Ok(Some(StoredCheckpoint {
            parameters,
            metadata: self.load_metadata(),
        }))
    }

    fn load_metadata(&self) -> Option<CheckpointMetadata> {
        let path = self.metadata_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("ignoring unreadable metadata {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("ignoring malformed metadata {}: {e}", path.display());
                None
            }
        }
    }

    /// Write metadata, then parameters. Each file is written to a temporary
    /// sibling and renamed into place, so an interrupted save leaves the
    /// previous file intact. The parameter file is renamed last; if a save
    /// stops between the two, the counters run ahead of the stored weights
    /// by at most one save interval.
    pub fn save(
        &self,
        parameters: &Parameters,
        metadata: &CheckpointMetadata,
    ) -> Result<PathBuf, CheckpointError> {
        let path = self.config.parameters_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CheckpointError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        write_atomic(
            &self.metadata_path(),
            &serde_json::to_string_pretty(metadata)?,
        )?;
        write_atomic(&path, &serde_json::to_string(parameters)?)?;
        Ok(path)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), CheckpointError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).map_err(|e| CheckpointError::Write {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, path).map_err(|e| CheckpointError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Activation, FeedForwardNetwork};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store_in(dir: &Path) -> ParameterStore {
        ParameterStore::new(ParameterStoreConfig {
            parameters_path: dir.join("params.json"),
        })
    }

    fn small_network(seed: u64) -> FeedForwardNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        FeedForwardNetwork::with_rng(4, 3, 1, 2, Activation::Sigmoid, &mut rng).unwrap()
    }

    fn metadata(games: usize) -> CheckpointMetadata {
        CheckpointMetadata {
            games_played: games,
            wins: games / 2,
            losses: games - games / 2,
            layer_widths: vec![4, 2, 3],
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(dir.path()).load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let params = small_network(1).parameters();

        let path = store.save(&params, &metadata(20)).unwrap();
        assert_eq!(path, dir.path().join("params.json"));
        assert!(dir.path().join("params.meta.json").exists());
        assert!(!dir.path().join("params.json.tmp").exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.parameters, params);
        assert_eq!(loaded.metadata, Some(metadata(20)));
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&small_network(1).parameters(), &metadata(10)).unwrap();
        let newer = small_network(2).parameters();
        store.save(&newer, &metadata(20)).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.parameters, newer);
        assert_eq!(loaded.metadata.unwrap().games_played, 20);
    }

    #[test]
    fn test_weights_reload_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let params = Parameters {
            weights: vec![vec![vec![0.42649302554852275, 0.1 + 0.2]]],
            bias: vec![vec![f64::MIN_POSITIVE, 0.9999999999999999]],
        };
        store.save(&params, &metadata(1)).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(
            loaded.parameters.weights[0][0][0].to_bits(),
            0.42649302554852275f64.to_bits()
        );
        assert_eq!(loaded.parameters, params);
    }

    #[test]
    fn test_failed_parameter_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let older = small_network(1).parameters();
        store.save(&older, &metadata(10)).unwrap();

        // A directory squatting on the temp name makes the parameter write fail.
        fs::create_dir(dir.path().join("params.json.tmp")).unwrap();
        let result = store.save(&small_network(2).parameters(), &metadata(20));
        assert!(matches!(result, Err(CheckpointError::Write { .. })));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.parameters, older);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParameterStore::new(ParameterStoreConfig {
            parameters_path: dir.path().join("nested/deeper/params.json"),
        });
        store.save(&small_network(1).parameters(), &metadata(0)).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_malformed_parameters_are_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.parameters_path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(CheckpointError::Parse { .. })));
    }

    #[test]
    fn test_malformed_metadata_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let params = small_network(3).parameters();
        store.save(&params, &metadata(5)).unwrap();
        fs::write(store.metadata_path(), "garbage").unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.parameters, params);
        assert!(loaded.metadata.is_none());
    }

    #[test]
    fn test_parameter_file_uses_pascal_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&small_network(1).parameters(), &metadata(0)).unwrap();
        let text = fs::read_to_string(store.parameters_path()).unwrap();
        assert!(text.contains("\"Weights\""));
        assert!(text.contains("\"Bias\""));
    }
}
