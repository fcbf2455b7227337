//! User settings: the durable JSON record that gates features.
//!
//! # Module Structure
//!
//! ```text
//! settings/
//! ├── snapshot   # Immutable Snapshot (key → JSON value)
//! ├── defaults   # First-run record
//! ├── store      # SettingsStore (load / save / current)
//! ├── watch      # SettingsWatch (notify-based change notifications)
//! └── error      # SettingsError
//! ```

mod defaults;
mod error;
mod snapshot;
mod store;
mod watch;

pub use defaults::default_record;
pub use error::SettingsError;
pub use snapshot::Snapshot;
pub use store::SettingsStore;
pub use watch::SettingsWatch;
