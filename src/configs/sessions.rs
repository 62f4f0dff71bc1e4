use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionsConfig {
    /// How long a stopped session keeps being reported before it is pruned.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

impl SessionsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs.max(1))
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_prune_interval_secs() -> u64 {
    60
}
