//! `[supervisor]` section configuration.
//!
//! Timing of the reconciliation loop.
//!
//! # Example
//!
//! ```toml
//! [supervisor]
//! debounce_ms = 500         # Quiet period before a burst of edits is applied
//! settle_ms = 300           # Pause between stop and restart on reconfigure
//! startup_delay_ms = 1000   # Delay before the first sync after launch
//! stop_timeout_ms = 3000    # Grace period after SIGTERM before killing
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub debounce_ms: u64,
    pub settle_ms: u64,
    pub startup_delay_ms: u64,
    pub stop_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            settle_ms: 300,
            startup_delay_ms: 1000,
            stop_timeout_ms: 3000,
        }
    }
}

impl SupervisorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Names of fields that must be non-zero but are not.
    pub(in crate::config) fn zero_fields(&self) -> Vec<&'static str> {
        [
            ("debounce_ms", self.debounce_ms),
            ("settle_ms", self.settle_ms),
            ("stop_timeout_ms", self.stop_timeout_ms),
        ]
        .into_iter()
        .filter(|(_, value)| *value == 0)
        .map(|(name, _)| name)
        .collect()
    }
}
