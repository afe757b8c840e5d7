mod metadata;
mod store;

pub use metadata::CheckpointMetadata;
pub use store::{ParameterStore, ParameterStoreConfig, StoredCheckpoint};
