//! `[display_filter]` section configuration.
//!
//! ```toml
//! [display_filter]
//! off_command = ["nightlight", "off"]   # run when blue_light_filter stops
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayFilterConfig {
    pub off_command: Vec<String>,
}

impl Default for DisplayFilterConfig {
    fn default() -> Self {
        Self {
            off_command: vec!["nightlight".to_string(), "off".to_string()],
        }
    }
}
