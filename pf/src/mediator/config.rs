//! Mediator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Mediator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediatorConfig {
    /// Selector of the element pages are swapped into
    #[serde(default = "default_root")]
    pub root: String,

    /// How long callers wait for a navigation to settle, in milliseconds
    #[serde(rename = "idle-timeout-ms", default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

fn default_root() -> String {
    debug!("default_root: called");
    "body".to_string()
}

fn default_idle_timeout_ms() -> u64 {
    debug!("default_idle_timeout_ms: called");
    5_000
}

impl Default for MediatorConfig {
    fn default() -> Self {
        debug!("MediatorConfig::default: called");
        Self {
            root: default_root(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl MediatorConfig {
    /// Get the idle timeout as a Duration
    pub fn idle_timeout(&self) -> Duration {
        debug!(idle_timeout_ms = %self.idle_timeout_ms, "MediatorConfig::idle_timeout: called");
        Duration::from_millis(self.idle_timeout_ms)
    }
}
