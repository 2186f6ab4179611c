use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_true")]
    pub http: bool,
    #[serde(default)]
    pub local: bool,
    /// Directory searched for free-text queries by the local source.
    #[serde(default)]
    pub local_library: Option<String>,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            http: true,
            local: false,
            local_library: None,
            search_limit: default_search_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_search_limit() -> usize {
    5
}
