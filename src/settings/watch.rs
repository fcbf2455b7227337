//! Change notifications for the settings file.
//!
//! Detection is coarse: every create/write touching the file reloads it and
//! reports the resulting snapshot, so one editor save may produce several
//! notifications carrying the same content. Consumers must debounce.
//!
//! ```text
//! notify (callback thread) → std channel → forwarding thread → reload → on_change
//! ```

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{SettingsError, SettingsStore, Snapshot};
use crate::{debug, log};

/// Active watch on the settings file. Dropping it releases the watch.
pub struct SettingsWatch {
    /// Watcher handle (must be kept alive)
    watcher: Option<RecommendedWatcher>,
    forwarder: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl SettingsWatch {
    /// Start watching `store`'s file, calling `on_change` for each relevant event.
    ///
    /// The parent directory is watched (not the file) so editors that save by
    /// rename-replace keep being observed. Run
    /// [`SettingsStore::ensure_default`] first; the directory must exist.
    pub fn start<F>(store: Arc<SettingsStore>, on_change: F) -> Result<Self, SettingsError>
    where
        F: Fn(Snapshot) + Send + 'static,
    {
        let path = store.path().to_path_buf();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::env::current_dir().map_err(|e| SettingsError::Io(path.clone(), e))?,
        };
        let file_name = path.file_name().map(OsString::from).unwrap_or_default();

        let (notify_tx, notify_rx) = std::sync::mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .map_err(|e| SettingsError::Watch(path.clone(), e))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| SettingsError::Watch(path.clone(), e))?;

        let active = Arc::new(AtomicBool::new(true));
        let thread_active = Arc::clone(&active);

        let forwarder = std::thread::Builder::new()
            .name("eyeward-settings-watch".to_string())
            .spawn(move || {
                while let Ok(result) = notify_rx.recv() {
                    if !thread_active.load(Ordering::Acquire) {
                        break;
                    }
                    match result {
                        Ok(event) if is_settings_write(&event, &file_name) => {
                            debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
                            on_change(store.reload());
                        }
                        Ok(_) => {}
                        Err(e) => log!("watch"; "notify error: {}", e),
                    }
                }
            })
            .map_err(|e| SettingsError::Io(path.clone(), e))?;

        log!("watch"; "watching {}", path.display());

        Ok(Self {
            watcher: Some(watcher),
            forwarder: Some(forwarder),
            active,
        })
    }

    /// Whether change notifications are still being delivered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop watching. Idempotent.
    pub fn release(&mut self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }

        // Dropping the watcher drops the notify sender, which ends the forwarder.
        drop(self.watcher.take());
        if let Some(handle) = self.forwarder.take() {
            let _ = handle.join();
        }
        debug!("watch"; "released");
    }
}

impl Drop for SettingsWatch {
    fn drop(&mut self) {
        self.release();
    }
}

/// Create or content modification of the settings file itself.
fn is_settings_write(event: &Event, file_name: &OsString) -> bool {
    let relevant_kind = match event.kind {
        EventKind::Create(_) => true,
        // Metadata-only changes (mtime/chmod) carry no new content
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };

    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p.file_name().map(Path::new) == Some(Path::new(file_name)))
}
