//! Settings store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Reading, writing or watching the settings file failed.
///
/// Callers treat every variant as "no change": the previous snapshot stays in
/// effect and the failure is logged.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("settings file `{0}` is not valid JSON")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("settings file `{0}` must contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("failed to serialize settings for `{0}`")]
    Serialize(PathBuf, #[source] serde_json::Error),

    #[error("failed to watch `{0}`")]
    Watch(PathBuf, #[source] notify::Error),
}
