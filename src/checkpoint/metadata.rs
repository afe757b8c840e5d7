/// Training progress written next to the parameter file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CheckpointMetadata {
    pub games_played: usize,
    pub wins: usize,
    pub losses: usize,
    /// Node counts of every node layer, input first.
    pub layer_widths: Vec<usize>,
    /// Seconds since the unix epoch.
    pub timestamp: u64,
}
