use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// How long the simulated device "plays" each track.
    #[serde(default = "default_simulated_track_secs")]
    pub simulated_track_secs: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            simulated_track_secs: default_simulated_track_secs(),
        }
    }
}

fn default_simulated_track_secs() -> u64 {
    180
}
