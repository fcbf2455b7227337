//! Actor Message Definitions
//!
//! ```text
//! SettingsWatch --Snapshot--> WatchActor --Reconcile--> SupervisorActor
//!                                 startup sync --Reconcile--^
//! monitor tasks --ExitNotice (own channel)----------------^
//! ```

use tokio::sync::oneshot;

use crate::settings::Snapshot;

// =============================================================================
// SupervisorActor Messages
// =============================================================================

/// Messages to Supervisor Actor
#[derive(Debug)]
pub enum SupervisorMsg {
    /// Apply a new settings snapshot (one reconciliation pass)
    Reconcile(Snapshot),
    /// Report the features currently registered
    Status {
        reply: oneshot::Sender<Vec<&'static str>>,
    },
    /// Stop every feature, then exit the actor loop
    Shutdown {
        done: oneshot::Sender<ShutdownReport>,
    },
}

/// What the stop-all procedure did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Features that were running, in stop order.
    pub stopped: Vec<&'static str>,
    /// Subset of `stopped` that had to be force killed.
    pub killed: Vec<&'static str>,
    /// The registry held nothing afterwards.
    pub registry_empty: bool,
    /// The settings watch was released.
    pub watch_released: bool,
}
