//! Process lifecycle error types.

use std::path::PathBuf;
use thiserror::Error;

/// A feature could not be started. The feature stays unregistered.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("script for `{feature}` not found at `{}`", path.display())]
    ScriptMissing {
        feature: &'static str,
        path: PathBuf,
    },

    #[error("failed to spawn `{program}` for `{feature}`")]
    Spawn {
        feature: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// The display-filter "off" command failed. Never blocks unregistration.
#[derive(Debug, Error)]
pub enum StopError {
    #[error("stop command for `{feature}` is empty")]
    EmptyCommand { feature: &'static str },

    #[error("stop command for `{feature}` failed: {message}")]
    Failed {
        feature: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_display() {
        let err = LaunchError::ScriptMissing {
            feature: "night_limit",
            path: PathBuf::from("backend/features/night_limit.py"),
        };
        let display = err.to_string();
        assert!(display.contains("night_limit"));
        assert!(display.contains("backend/features/night_limit.py"));

        let err = LaunchError::Spawn {
            feature: "daily_limit",
            program: "python3".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("`python3`"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
