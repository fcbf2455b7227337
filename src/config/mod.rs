//! Supervisor configuration from `eyeward.toml`.
//!
//! This is the supervisor's own configuration, not the user settings record
//! (see `crate::settings`). The file is optional; every field has a default.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/           # Configuration section definitions
//! │   ├── settings       # [settings]
//! │   ├── supervisor     # [supervisor]
//! │   ├── launcher       # [launcher]
//! │   └── display_filter # [display_filter]
//! ├── error              # ConfigError
//! └── mod.rs             # AppConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[settings]`       | Location of the user settings file               |
//! | `[supervisor]`     | Debounce, settle, startup and stop timing        |
//! | `[launcher]`       | Command line used to start a feature             |
//! | `[display_filter]` | Command that turns the system display filter off |

mod error;
mod section;

pub use error::ConfigError;
pub use section::{DisplayFilterConfig, LauncherConfig, SettingsSectionConfig, SupervisorConfig};

use crate::{cli::Cli, debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing eyeward.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Application root: feature programs run here (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub settings: SettingsSectionConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub launcher: LauncherConfig,

    #[serde(default)]
    pub display_filter: DisplayFilterConfig,
}

impl AppConfig {
    /// Load configuration for the given CLI arguments.
    ///
    /// The root is `--root` (default: current directory). The config file is
    /// resolved against the root and may be absent.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let root = match &cli.root {
            Some(root) => resolve_path(root, &cwd),
            None => cwd,
        };
        let config_path = resolve_path(&cli.config, &root);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.config_path = config_path;
        config.root = root;
        if let Some(settings) = &cli.settings {
            config.settings.path = settings.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Unknown fields are reported but never fatal.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored): {}", display_path, fields.join(", "));
    }

    /// Reject values the supervisor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = self.supervisor.zero_fields();
        if !zero.is_empty() {
            return Err(ConfigError::Validation(format!(
                "[supervisor] {} must be greater than 0",
                zero.join(", ")
            )));
        }
        if self.launcher.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[launcher] program must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Get the root directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the user settings file.
    pub fn settings_path(&self) -> PathBuf {
        resolve_path(&self.settings.path, &self.root)
    }
}

/// Expand `~` and make `path` absolute against `base`.
fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> AppConfig {
    let (parsed, ignored) = AppConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) = AppConfig::parse_with_ignored(
            "[supervisor]\nsettle_ms = 10\nretries = 3\n[extra]\na = 1",
        )
        .unwrap();
        assert_eq!(config.supervisor.settle_ms, 10);
        assert_eq!(ignored.len(), 2);
        assert!(ignored.iter().any(|f| f == "supervisor.retries"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::parse_with_ignored("[supervisor\nsettle_ms = ").is_err());
        assert!(AppConfig::parse_with_ignored("[supervisor]\nsettle_ms = \"fast\"").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timing() {
        let config = test_parse_config("[supervisor]\ndebounce_ms = 0");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));

        let config = test_parse_config("[launcher]\nprogram = \" \"");
        assert!(config.validate().is_err());

        assert!(test_parse_config("").validate().is_ok());
    }

    #[test]
    fn test_settings_path_resolution() {
        let mut config = test_parse_config("");
        config.root = PathBuf::from("/app");
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/app/backend/assets/settings.json")
        );

        config.settings.path = PathBuf::from("/etc/eyeward/settings.json");
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/etc/eyeward/settings.json")
        );
    }

    #[test]
    fn test_load_from_root_with_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("eyeward.toml"),
            "[supervisor]\nsettle_ms = 42\n",
        )
        .unwrap();

        let root = dir.path().to_string_lossy().to_string();
        let cli = Cli::parse_from(["eyeward", "--root", &root, "--settings", "custom.json"]);
        let config = AppConfig::load(&cli).unwrap();

        assert_eq!(config.supervisor.settle_ms, 42);
        assert_eq!(config.root(), dir.path());
        assert_eq!(config.settings_path(), dir.path().join("custom.json"));
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let cli = Cli::parse_from(["eyeward", "--root", &root, "features"]);
        let config = AppConfig::load(&cli).unwrap();

        assert_eq!(config.supervisor.debounce_ms, 500);
        assert_eq!(config.config_path, dir.path().join("eyeward.toml"));
    }
}
