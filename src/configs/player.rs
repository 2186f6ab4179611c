use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    /// Inactivity window before an idle session drops its output handle.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Volume new sessions start with, 0-100.
    #[serde(default = "default_volume")]
    pub default_volume: u8,
}

impl PlayerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            default_volume: default_volume(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_volume() -> u8 {
    100
}
