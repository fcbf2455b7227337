//! `eyeward features` / `enable` / `disable`: the feature table against the
//! current settings, and toggling one feature's enable flag.

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};

use crate::config::AppConfig;
use crate::feature::{self, FEATURES, FeatureDescriptor};
use crate::log;
use crate::settings::{SettingsStore, Snapshot};

/// Print every known feature and whether the settings file enables it.
pub fn list_features(config: &AppConfig) -> Result<()> {
    let store = SettingsStore::new(config.settings_path());
    let snapshot = if store.path().exists() {
        store.load()?
    } else {
        log!("features"; "{} not found, showing defaults", store.path().display());
        Snapshot::empty()
    };

    for feature in FEATURES {
        println!("{}", format_row(feature, &snapshot));
    }
    Ok(())
}

/// Set `name`'s enable flag in the settings file, keeping every other key.
///
/// A running supervisor picks the change up through its settings watch.
pub fn set_feature(config: &AppConfig, name: &str, enabled: bool) -> Result<()> {
    let Some(feature) = feature::find(name) else {
        let known: Vec<_> = FEATURES.iter().map(|f| f.name).collect();
        bail!("unknown feature `{}` (known: {})", name, known.join(", "));
    };

    let store = SettingsStore::new(config.settings_path());
    store.ensure_default()?;
    let current = store.load()?;
    if current.is_enabled(feature.enable_key) == enabled {
        log!("features"; "{} already {}", feature.name, if enabled { "on" } else { "off" });
        return Ok(());
    }

    store.save(&current.with(feature.enable_key, enabled))?;
    log!("features"; "{} turned {}", feature.name, if enabled { "on" } else { "off" });
    Ok(())
}

fn format_row(feature: &FeatureDescriptor, snapshot: &Snapshot) -> String {
    let state = if snapshot.is_enabled(feature.enable_key) {
        "on ".if_supports_color(Stream::Stdout, |t| t.green()).to_string()
    } else {
        "off".if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string()
    };
    let mut row = format!("{} {:<22} {}", state, feature.name, feature.enable_key);
    if !feature.reconfig_keys.is_empty() {
        row.push_str(&format!("  [{}]", feature.reconfig_keys.join(", ")));
    }
    if feature.stop_hook.is_some() {
        row.push_str("  (stop hook)");
    }
    row
}
