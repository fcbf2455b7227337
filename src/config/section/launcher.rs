//! `[launcher]` section configuration.
//!
//! How a feature name becomes a command line. `$FEATURE`, `$SCRIPT` and
//! `$ROOT` are substituted in `args`; `$FEATURE` in `script`.
//!
//! # Example
//!
//! ```toml
//! [launcher]
//! program = "python3"
//! args = ["-m", "backend.features.$FEATURE"]
//! script = "backend/features/$FEATURE.py"
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Interpreter or executable started for every feature.
    pub program: String,

    pub args: Vec<String>,

    /// Path (relative to the root) that must exist before launching.
    pub script: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let program = if cfg!(windows) { "python" } else { "python3" };
        Self {
            program: program.to_string(),
            args: vec!["-m".to_string(), "backend.features.$FEATURE".to_string()],
            script: "backend/features/$FEATURE.py".to_string(),
        }
    }
}
