//! Built-in settings record written on first run.

use serde_json::json;

use super::Snapshot;

/// The record persisted when no settings file exists.
///
/// Every feature starts disabled. Key order is the on-disk order.
pub fn default_record() -> Snapshot {
    let value = json!({
        "eye_strain_prevention_enable": false,
        "distance_check_enable": false,
        "night_limit_enable": false,
        "night_limit_time": "22:00",
        "daily_limit_enable": false,
        "daily_limit_time": 4,
        "break_reminders_enable": false,
        "blue_light_filter_enable": false,
        "blue_light_filter_day": 0,
        "blue_light_filter_evening": 0,
        "blue_light_filter_night": 80
    });

    Snapshot::from_value(value).unwrap_or_default()
}
