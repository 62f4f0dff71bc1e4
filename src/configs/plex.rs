use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upstream media server connection.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlexConfig {
    /// Base URL, e.g. `https://plex.local:32400`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub skip_tls_verification: bool,
    /// How often library, resource and bandwidth statistics are refreshed.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl PlexConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            skip_tls_verification: false,
            refresh_interval_secs: default_refresh_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}
