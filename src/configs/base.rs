use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reads `path`. `None` when the file does not exist, so the caller
    /// can fall back to defaults once logging is up.
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let config_str = std::fs::read_to_string(path)?;
        Self::parse(&config_str).map(Some)
    }

    pub fn parse(config_str: &str) -> AnyResult<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }
}
