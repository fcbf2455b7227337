//! Durable settings file with an atomically swappable current snapshot.
//!
//! Uses `arc-swap` so the watcher thread can publish a freshly loaded record
//! while the supervisor and CLI read the current one without locking.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use super::{SettingsError, Snapshot, default_record};
use crate::{debug, log};

/// Owns the settings file path and the last successfully loaded snapshot.
pub struct SettingsStore {
    path: PathBuf,
    current: ArcSwap<Snapshot>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the default record if the file does not exist yet.
    ///
    /// Creates the containing directory. Returns `true` when a file was written.
    pub fn ensure_default(&self) -> Result<bool, SettingsError> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| SettingsError::Io(dir.to_path_buf(), e))?;
        }

        self.save(&default_record())?;
        log!("settings"; "created default settings at {}", self.path.display());
        Ok(true)
    }

    /// Read the file and publish the result.
    ///
    /// A missing file is an error like any other read failure; only
    /// [`ensure_default`](Self::ensure_default) ever creates it.
    pub fn load(&self) -> Result<Snapshot, SettingsError> {
        let snapshot = self.read()?;
        self.current.store(Arc::new(snapshot.clone()));
        Ok(snapshot)
    }

    /// Load, falling back to the previous snapshot on failure.
    pub fn reload(&self) -> Snapshot {
        match self.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log!("settings"; "{}, keeping previous settings", e);
                self.current()
            }
        }
    }

    /// Last successfully loaded snapshot (empty before the first load).
    pub fn current(&self) -> Snapshot {
        self.current.load_full().as_ref().clone()
    }

    /// Replace the whole file with `snapshot`.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SettingsError> {
        let content = snapshot
            .to_pretty_json()
            .map_err(|e| SettingsError::Serialize(self.path.clone(), e))?;
        fs::write(&self.path, content).map_err(|e| SettingsError::Io(self.path.clone(), e))?;
        debug!("settings"; "wrote {}", self.path.display());
        Ok(())
    }

    fn read(&self) -> Result<Snapshot, SettingsError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| SettingsError::Io(self.path.clone(), e))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| SettingsError::Parse(self.path.clone(), e))?;
        Snapshot::from_value(value).ok_or_else(|| SettingsError::NotAnObject(self.path.clone()))
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
