//! Actor Coordinator - wires up the supervision system
//!
//! The Coordinator is a thin orchestrator that:
//! - Bootstraps the settings file and starts watching it
//! - Spawns the supervisor and watch actors
//! - Schedules the startup sync
//! - Waits for a shell event, then runs the stop-all procedure once
//!
//! ```text
//! SettingsWatch → WatchActor → SupervisorActor ← startup sync
//!                                    ▲
//!                 ShellEvent ── Running::handle_shell_event (latched)
//! ```


use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::ShutdownReport;
use super::supervisor::{SupervisorActor, SupervisorHandle, SupervisorOptions};
use super::watch::WatchActor;
use crate::config::AppConfig;
use crate::core::{ShellEvent, ShutdownLatch, is_shutdown};
use crate::process::Spawner;
use crate::settings::{SettingsStore, SettingsWatch};
use crate::{debug, log};

/// How often the shell event channel is polled.
const SHELL_POLL: Duration = Duration::from_millis(100);

// =============================================================================
// Coordinator
// =============================================================================

pub struct Coordinator {
    config: Arc<AppConfig>,
    spawner: Arc<dyn Spawner>,
    shell_rx: Receiver<ShellEvent>,
}

impl Coordinator {
    pub fn new(
        config: Arc<AppConfig>,
        spawner: Arc<dyn Spawner>,
        shell_rx: Receiver<ShellEvent>,
    ) -> Self {
        Self {
            config,
            spawner,
            shell_rx,
        }
    }

    /// Supervise until the first shell event, then stop everything.
    pub async fn run(self) -> Result<ShutdownReport> {
        let store = Arc::new(SettingsStore::new(self.config.settings_path()));
        let mut running = Running::start(store, self.spawner, &self.config)?;
        running.schedule_startup_sync(self.config.supervisor.startup_delay());

        let report = loop {
            let event = match self.shell_rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => {
                    tokio::time::sleep(SHELL_POLL).await;
                    continue;
                }
                // Every event source is gone; nothing can ask us to quit
                Err(TryRecvError::Disconnected) => ShellEvent::BeforeQuit,
            };
            if let Some(report) = running.handle_shell_event(event).await {
                break report;
            }
        };

        while let Ok(event) = self.shell_rx.try_recv() {
            running.handle_shell_event(event).await;
        }

        Ok(report)
    }
}

// =============================================================================
// Running system
// =============================================================================

/// The live supervision system between startup and shutdown.
pub struct Running {
    store: Arc<SettingsStore>,
    supervisor: SupervisorHandle,
    watch: Option<SettingsWatch>,
    latch: ShutdownLatch,
    startup_sync: Option<JoinHandle<()>>,
}

impl Running {
    /// Ensure the settings file exists, then start the actors and the watch.
    pub fn start(
        store: Arc<SettingsStore>,
        spawner: Arc<dyn Spawner>,
        config: &AppConfig,
    ) -> Result<Self> {
        store
            .ensure_default()
            .context("failed to create default settings")?;
        if let Err(e) = store.load() {
            log!("settings"; "{}, starting with no features", e);
        }

        let (supervisor, _) =
            SupervisorActor::spawn(spawner, SupervisorOptions::from_config(config));

        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let watch = SettingsWatch::start(Arc::clone(&store), move |snapshot| {
            let _ = snapshot_tx.send(snapshot);
        })?;
        tokio::spawn(
            WatchActor::new(snapshot_rx, supervisor.sender(), config.supervisor.debounce()).run(),
        );

        Ok(Self {
            store,
            supervisor,
            watch: Some(watch),
            latch: ShutdownLatch::new(),
            startup_sync: None,
        })
    }

    #[cfg(test)]
    pub fn supervisor(&self) -> &SupervisorHandle {
        &self.supervisor
    }

    /// After `delay`, reconcile the current settings against "nothing running".
    ///
    /// Goes through the supervisor queue like any change-driven pass.
    pub fn schedule_startup_sync(&mut self, delay: Duration) {
        let store = Arc::clone(&self.store);
        let supervisor = self.supervisor.clone();
        self.startup_sync = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if is_shutdown() {
                return;
            }
            log!("supervisor"; "syncing features with {}", store.path().display());
            supervisor.reconcile(store.current()).await;
            match supervisor.status().await {
                Some(running) if running.is_empty() => {
                    log!("supervisor"; "no features enabled");
                }
                Some(running) => log!("supervisor"; "running: {}", running.join(", ")),
                None => {}
            }
        }));
    }

    /// Run the stop-all procedure for the first event; later events are no-ops.
    pub async fn handle_shell_event(&mut self, event: ShellEvent) -> Option<ShutdownReport> {
        if !self.latch.try_begin() {
            debug!("shutdown"; "{} ignored, already shut down", event.label());
            return None;
        }
        log!("shutdown"; "{}", event.label());

        if let Some(task) = self.startup_sync.take() {
            task.abort();
        }

        let mut report = match self.supervisor.shutdown().await {
            Some(report) => report,
            None => {
                // The actor stops everything itself when it exits early
                debug!("shutdown"; "supervisor already stopped");
                ShutdownReport {
                    registry_empty: true,
                    ..Default::default()
                }
            }
        };

        if let Some(mut watch) = self.watch.take() {
            watch.release();
            report.watch_released = !watch.is_active();
        }

        log!("shutdown"; "stopped {} feature(s)", report.stopped.len());
        Some(report)
    }
}
