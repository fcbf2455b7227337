//! Static feature table and settings diffing.
//!
//! A feature is one independently toggleable background program. Its
//! descriptor names the boolean setting that gates it and the settings whose
//! change requires a restart.

mod diff;

pub use diff::{Action, diff};

/// Extra cleanup performed when a feature is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopHook {
    /// Run the configured display-filter "off" command.
    DisplayFilterOff,
}

/// Compile-time description of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub name: &'static str,
    pub enable_key: &'static str,
    pub reconfig_keys: &'static [&'static str],
    pub stop_hook: Option<StopHook>,
}

impl FeatureDescriptor {
    const fn new(name: &'static str, enable_key: &'static str) -> Self {
        Self {
            name,
            enable_key,
            reconfig_keys: &[],
            stop_hook: None,
        }
    }

    const fn reconfig(mut self, keys: &'static [&'static str]) -> Self {
        self.reconfig_keys = keys;
        self
    }

    const fn on_stop(mut self, hook: StopHook) -> Self {
        self.stop_hook = Some(hook);
        self
    }
}

/// Every feature the supervisor manages. Fixed for the life of the process.
pub static FEATURES: &[FeatureDescriptor] = &[
    FeatureDescriptor::new("eye_strain_prevention", "eye_strain_prevention_enable")
        .reconfig(&["eye_strain_prevention_ratios"]),
    FeatureDescriptor::new("distance_check", "distance_check_enable")
        .reconfig(&["distance_check_area"]),
    FeatureDescriptor::new("night_limit", "night_limit_enable").reconfig(&["night_limit_time"]),
    FeatureDescriptor::new("daily_limit", "daily_limit_enable").reconfig(&["daily_limit_time"]),
    FeatureDescriptor::new("break_reminders", "break_reminders_enable"),
    FeatureDescriptor::new("blue_light_filter", "blue_light_filter_enable")
        .reconfig(&[
            "blue_light_filter_day",
            "blue_light_filter_evening",
            "blue_light_filter_night",
        ])
        .on_stop(StopHook::DisplayFilterOff),
];

/// Look up a feature by name.
pub fn find(name: &str) -> Option<&'static FeatureDescriptor> {
    FEATURES.iter().find(|f| f.name == name)
}
