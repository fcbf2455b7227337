//! Actor System for Feature Supervision
//!
//! Message-passing concurrency for `eyeward run`:
//!
//! ```text
//! SettingsWatch --> WatchActor --> SupervisorActor --> feature processes
//!   (notify)       (debounce)     (diff, start/stop)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `watch` - Debounces settings snapshots into reconcile requests
//! - `supervisor` - Owns the process registry and applies diffs
//! - `coordinator` - Wires up and runs actors, handles shutdown

pub mod coordinator;
pub mod messages;
pub mod supervisor;
pub mod watch;

pub use coordinator::Coordinator;
