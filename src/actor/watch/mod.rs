//! Watch Actor
//!
//! Turns the raw stream of settings snapshots (one per file notification)
//! into debounced reconciliation requests.
//!
//! ```text
//! SettingsWatch → Snapshot channel → Debouncer (last wins) → SupervisorMsg::Reconcile
//! ```

mod debouncer;

use std::time::Duration;

use tokio::sync::mpsc;

use super::messages::SupervisorMsg;
use crate::debug;
use crate::settings::Snapshot;
use debouncer::Debouncer;

pub struct WatchActor {
    /// Snapshots from the settings watch callback
    rx: mpsc::UnboundedReceiver<Snapshot>,
    /// Channel to send messages to SupervisorActor
    supervisor_tx: mpsc::Sender<SupervisorMsg>,
    debouncer: Debouncer<Snapshot>,
}

impl WatchActor {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Snapshot>,
        supervisor_tx: mpsc::Sender<SupervisorMsg>,
        window: Duration,
    ) -> Self {
        Self {
            rx,
            supervisor_tx,
            debouncer: Debouncer::new(window),
        }
    }

    /// Run the actor event loop
    ///
    /// Ends when the settings watch is released (sender dropped) or the
    /// supervisor is gone. A burst still pending at that point is dropped.
    pub async fn run(self) {
        let Self {
            mut rx,
            supervisor_tx,
            mut debouncer,
        } = self;

        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(snapshot) => debouncer.push(snapshot),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some((snapshot, burst)) = debouncer.take_if_ready() else {
                        continue;
                    };
                    debug!("watch"; "settings changed ({} notification(s) coalesced)", burst);
                    if supervisor_tx.send(SupervisorMsg::Reconcile(snapshot)).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("watch"; "stopped");
    }
}
