use serde::{Deserialize, Serialize};

/// Batch expansion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Prefix turning a bare entry id into a watch URL.
    #[serde(default = "default_watch_url_base")]
    pub watch_url_base: String,
}

fn default_watch_url_base() -> String {
    "https://www.youtube.com/watch?v=".to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            watch_url_base: default_watch_url_base(),
        }
    }
}

impl BatchConfig {
    pub fn with_watch_url_base(mut self, base: impl Into<String>) -> Self {
        self.watch_url_base = base.into();
        self
    }
}
