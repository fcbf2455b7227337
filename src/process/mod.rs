//! Feature processes: launching, observing, stopping and tracking them.
//!
//! # Module Structure
//!
//! ```text
//! process/
//! ├── handle     # ProcessHandle (one live child + its monitor task)
//! ├── launch     # Launcher (command line resolution, spawn)
//! ├── output     # stdout/stderr line forwarding
//! ├── registry   # ProcessRegistry (at most one handle per feature)
//! ├── hook       # Display-filter stop command
//! └── error      # LaunchError, StopError
//! ```
//!
//! Exit observation flows back to the supervisor as [`ExitNotice`] messages;
//! nothing in this module mutates the registry from a monitor task.

mod error;
mod handle;
mod hook;
mod launch;
mod output;
mod registry;

use tokio::sync::mpsc;

use crate::feature::FeatureDescriptor;

pub use error::{LaunchError, StopError};
pub use handle::{ExitReport, ProcessHandle, StopOutcome};
pub use hook::run_stop_hook;
pub use launch::Launcher;
pub use registry::ProcessRegistry;

/// A feature process exited (requested or not).
#[derive(Debug, Clone)]
pub struct ExitNotice {
    pub feature: &'static str,
    /// Generation of the handle that exited; stale notices are ignored.
    pub generation: u64,
    pub report: ExitReport,
}

/// Where monitor tasks report exits.
pub type ExitSender = mpsc::UnboundedSender<ExitNotice>;

/// Creates feature processes.
///
/// [`Launcher`] is the real implementation; the seam lets the supervisor be
/// exercised with stand-in programs.
pub trait Spawner: Send + Sync {
    /// Start `feature`. Must be called from within a tokio runtime.
    fn spawn(
        &self,
        feature: &'static FeatureDescriptor,
        generation: u64,
        exit_tx: ExitSender,
    ) -> Result<ProcessHandle, LaunchError>;
}
