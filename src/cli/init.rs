//! `eyeward init`: bootstrap the settings file.

use anyhow::Result;

use crate::config::AppConfig;
use crate::log;
use crate::settings::SettingsStore;

/// Write the default settings record unless the file already exists, then
/// print the settings path.
pub fn init_settings(config: &AppConfig) -> Result<()> {
    let store = SettingsStore::new(config.settings_path());
    if !store.ensure_default()? {
        log!("init"; "settings already exist, leaving them untouched");
    }
    println!("{}", store.path().display());
    Ok(())
}
