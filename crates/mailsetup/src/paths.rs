//! Default file locations.

use std::path::PathBuf;

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "mailsetup";

/// Settings file, `<config dir>/mailsetup/settings.json`.
pub fn settings_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("settings.json")
}

/// Optional extra provider templates, `<config dir>/mailsetup/providers.json`.
pub fn providers_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("providers.json")
}

/// Account database, `<data dir>/mailsetup/mailsetup.db`.
pub fn database_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("mailsetup.db")
}
