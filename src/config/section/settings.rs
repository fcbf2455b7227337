//! `[settings]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [settings]
//! path = "backend/assets/settings.json"   # relative to the app root, `~` allowed
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location of the user settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsSectionConfig {
    pub path: PathBuf,
}

impl Default for SettingsSectionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("backend/assets/settings.json"),
        }
    }
}
