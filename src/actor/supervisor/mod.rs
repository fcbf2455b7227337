//! Supervisor Actor
//!
//! Sole owner of the process registry and the last-applied snapshot. Every
//! reconciliation pass, status query and exit notice is handled on this one
//! task, so two passes never interleave.
//!
//! ```text
//! Reconcile(snapshot) ─┐
//! Status / Shutdown ───┼──▶ SupervisorActor ──▶ Spawner / ProcessHandle
//! ExitNotice ──────────┘          │
//!                                 └──▶ ProcessRegistry
//! ```


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use super::messages::{ShutdownReport, SupervisorMsg};
use crate::config::AppConfig;
use crate::feature::{self, Action, FeatureDescriptor};
use crate::process::{
    self, ExitNotice, ExitSender, ProcessHandle, ProcessRegistry, Spawner, StopOutcome,
};
use crate::settings::Snapshot;
use crate::{debug, log};

const CHANNEL_BUFFER: usize = 32;

/// Timing and commands the supervisor needs.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Pause between stop and restart on reconfigure. Must be non-zero.
    pub settle: Duration,
    /// Grace period after a graceful stop request before killing.
    pub stop_timeout: Duration,
    pub display_filter_off: Vec<String>,
}

impl SupervisorOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            settle: config.supervisor.settle(),
            stop_timeout: config.supervisor.stop_timeout(),
            display_filter_off: config.display_filter.off_command.clone(),
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cheap, cloneable way to talk to the running supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<SupervisorMsg>,
}

impl SupervisorHandle {
    pub fn sender(&self) -> mpsc::Sender<SupervisorMsg> {
        self.tx.clone()
    }

    /// Queue a reconciliation pass. `false` if the supervisor has stopped.
    pub async fn reconcile(&self, snapshot: Snapshot) -> bool {
        self.tx.send(SupervisorMsg::Reconcile(snapshot)).await.is_ok()
    }

    /// Features currently registered, answered after all queued passes.
    pub async fn status(&self) -> Option<Vec<&'static str>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SupervisorMsg::Status { reply }).await.ok()?;
        rx.await.ok()
    }

    /// Stop every feature and end the actor.
    pub async fn shutdown(&self) -> Option<ShutdownReport> {
        let (done, rx) = oneshot::channel();
        self.tx.send(SupervisorMsg::Shutdown { done }).await.ok()?;
        rx.await.ok()
    }
}

// =============================================================================
// Actor
// =============================================================================

pub struct SupervisorActor {
    rx: mpsc::Receiver<SupervisorMsg>,
    exit_tx: ExitSender,
    exit_rx: mpsc::UnboundedReceiver<ExitNotice>,
    spawner: Arc<dyn Spawner>,
    registry: ProcessRegistry,
    last_applied: Snapshot,
    options: SupervisorOptions,
}

impl SupervisorActor {
    pub fn new(
        rx: mpsc::Receiver<SupervisorMsg>,
        spawner: Arc<dyn Spawner>,
        options: SupervisorOptions,
    ) -> Self {
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        Self {
            rx,
            exit_tx,
            exit_rx,
            spawner,
            registry: ProcessRegistry::new(),
            last_applied: Snapshot::empty(),
            options,
        }
    }

    /// Create the actor and run it on the current runtime.
    pub fn spawn(
        spawner: Arc<dyn Spawner>,
        options: SupervisorOptions,
    ) -> (SupervisorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let actor = Self::new(rx, spawner, options);
        let task = tokio::spawn(actor.run());
        (SupervisorHandle { tx }, task)
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                Some(notice) = self.exit_rx.recv() => self.on_exit(notice),
                msg = self.rx.recv() => match msg {
                    Some(SupervisorMsg::Reconcile(snapshot)) => self.reconcile(snapshot).await,
                    Some(SupervisorMsg::Status { reply }) => {
                        let _ = reply.send(self.registry.running());
                    }
                    Some(SupervisorMsg::Shutdown { done }) => {
                        let report = self.stop_all().await;
                        let _ = done.send(report);
                        break;
                    }
                    None => {
                        self.stop_all().await;
                        break;
                    }
                },
            }
        }
        debug!("supervisor"; "stopped");
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Apply `new` against the last-applied snapshot.
    ///
    /// The last-applied snapshot advances even when an action fails, so a
    /// broken feature is retried only by a later enable transition.
    async fn reconcile(&mut self, new: Snapshot) {
        let diff = feature::diff(&self.last_applied, &new);
        if diff.is_empty() {
            debug!("supervisor"; "no feature changes");
            self.last_applied = new;
            return;
        }

        let disable: Vec<_> = diff.with_action(Action::Disable).collect();
        if !disable.is_empty() {
            for feature in &disable {
                log!("supervisor"; "disabling {}", feature.name);
            }
            self.stop_features(&disable).await;
        }

        for feature in diff.with_action(Action::Enable) {
            log!("supervisor"; "enabling {}", feature.name);
            self.start(feature);
        }

        // Only a live process has stale settings to drop
        let reload: Vec<_> = diff
            .with_action(Action::Reconfigure)
            .filter(|f| self.registry.is_running(f.name))
            .collect();
        if !reload.is_empty() {
            for feature in &reload {
                log!("supervisor"; "reloading {} (settings changed)", feature.name);
            }
            self.stop_features(&reload).await;
            tokio::time::sleep(self.options.settle).await;
            for feature in &reload {
                self.start(feature);
            }
        }

        self.last_applied = new;
    }

    /// Spawn and register `feature` unless it already has a live process.
    fn start(&mut self, feature: &'static FeatureDescriptor) {
        if let Some(existing) = self.registry.get(feature.name) {
            if !existing.has_exited() {
                debug!("supervisor"; "{} already running", feature.name);
                return;
            }
            // Exited, but its notice is still queued behind this pass
            self.registry.unregister(feature.name);
        }

        let generation = self.registry.next_generation();
        match self.spawner.spawn(feature, generation, self.exit_tx.clone()) {
            Ok(handle) => {
                self.registry.register(handle);
            }
            Err(e) => log!("error"; "{}", e),
        }
    }

    /// Unregister and stop each of `features` that is running.
    async fn stop_features(&mut self, features: &[&'static FeatureDescriptor]) {
        let handles: Vec<_> = features
            .iter()
            .filter_map(|f| self.registry.unregister(f.name))
            .collect();
        self.stop_handles(handles).await;
    }

    /// Terminate `handles` concurrently, then run their stop hooks.
    async fn stop_handles(&self, handles: Vec<ProcessHandle>) -> Vec<(&'static str, StopOutcome)> {
        let timeout = self.options.stop_timeout;
        let mut tasks = JoinSet::new();
        for handle in handles {
            tasks.spawn(async move {
                let feature = handle.feature();
                (feature, handle.terminate(timeout).await)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => log!("error"; "stop task failed: {}", e),
            }
        }
        outcomes.sort_by_key(|(feature, _)| *feature);

        for (name, outcome) in &outcomes {
            match &outcome.report {
                Some(report) => log!("stop"; "{} stopped ({})", name, report),
                None => log!("error"; "{} did not confirm exit", name),
            }

            let Some(feature) = feature::find(name) else {
                continue;
            };
            let hook = process::run_stop_hook(feature, &self.options.display_filter_off);
            if let Err(e) = hook.await {
                log!("error"; "{}", e);
            }
        }

        outcomes
    }

    // =========================================================================
    // Exit notices and shutdown
    // =========================================================================

    fn on_exit(&mut self, notice: ExitNotice) {
        match self.registry.unregister_exited(notice.feature, notice.generation) {
            Some(_) => log!(
                "supervisor";
                "{} exited ({}), not restarting", notice.feature, notice.report
            ),
            None => debug!(
                "supervisor";
                "{} generation {} exited ({})", notice.feature, notice.generation, notice.report
            ),
        }
    }

    /// Stop everything in the registry.
    async fn stop_all(&mut self) -> ShutdownReport {
        let handles = self.registry.drain();
        if handles.is_empty() {
            log!("shutdown"; "no features running");
        } else {
            log!("shutdown"; "stopping {} feature(s)", handles.len());
        }

        let outcomes = self.stop_handles(handles).await;
        ShutdownReport {
            stopped: outcomes.iter().map(|(name, _)| *name).collect(),
            killed: outcomes
                .iter()
                .filter(|(_, outcome)| outcome.forced)
                .map(|(name, _)| *name)
                .collect(),
            registry_empty: self.registry.is_empty(),
            watch_released: false,
        }
    }
}
