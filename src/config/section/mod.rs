//! Configuration section definitions.

mod display_filter;
mod launcher;
mod settings;
mod supervisor;

pub use display_filter::DisplayFilterConfig;
pub use launcher::LauncherConfig;
pub use settings::SettingsSectionConfig;
pub use supervisor::SupervisorConfig;
