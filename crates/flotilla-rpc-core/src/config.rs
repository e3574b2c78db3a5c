//! API layer configuration.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Default values for configuration.
mod defaults {
    pub fn removal_poll_interval_ms() -> u64 {
        500
    }

    pub fn drain_timeout_ms() -> u64 {
        600_000
    }

    pub fn exec_timeout_ms() -> u64 {
        300_000
    }
}

/// Tunables for the control-plane API layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Fixed delay between unit-removal checks during a draining teardown.
    #[serde(default = "defaults::removal_poll_interval_ms")]
    pub removal_poll_interval_ms: u64,
    /// Total unit-drain budget when the caller supplies none.
    #[serde(default = "defaults::drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Per-target remote command timeout when the caller supplies none.
    #[serde(default = "defaults::exec_timeout_ms")]
    pub exec_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> ApiConfig {
        ApiConfig {
            removal_poll_interval_ms: defaults::removal_poll_interval_ms(),
            drain_timeout_ms: defaults::drain_timeout_ms(),
            exec_timeout_ms: defaults::exec_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn removal_poll_interval(&self) -> Duration {
        Duration::from_millis(self.removal_poll_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_millis(self.exec_timeout_ms)
    }
}
