//! Application directory paths for SIRA.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/sira/` | `~/.local/share/sira/` |
//! | Config | `~/Library/Application Support/sira/` | `~/.config/sira/` |
//!
//! # Environment Overrides
//!
//! - `SIRA_DATA_DIR`: overrides [`data_dir`]
//! - `SIRA_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root: the offline cache lives here.
///
/// Resolves to `dirs::data_dir()/sira/` by default. Override with the
/// `SIRA_DATA_DIR` environment variable.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SIRA_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("sira"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sira-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/sira/` by default. Override with the
/// `SIRA_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SIRA_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("sira"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sira-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
