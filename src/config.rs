//! Application configuration, persisted as TOML.
//!
//! ```toml
//! log_filter = "sira=info,sira_retrieval=info"
//!
//! [retrieval]
//! policy = "adaptive"
//! live_retries = 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sira_retrieval::RetrievalConfig;

use crate::error::{Result, SiraError};

/// Default `tracing` filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "sira=info,sira_retrieval=info";

/// Top-level configuration for the research assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiraConfig {
    /// Retrieval layer settings.
    pub retrieval: RetrievalConfig,
    /// `tracing` filter directive applied when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Data directory override. Relative cache and memory paths resolve
    /// against it.
    pub data_dir: Option<PathBuf>,
    /// JSON file holding remembered texts for `remember`/`recall`.
    pub memory_path: PathBuf,
}

impl Default for SiraConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            data_dir: None,
            memory_path: PathBuf::from("memory.json"),
        }
    }
}

impl SiraConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SiraError::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SiraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (see [`crate::sira_dirs::config_file`]).
    pub fn default_config_path() -> PathBuf {
        crate::sira_dirs::config_file()
    }

    /// Effective data directory: the override if set, else the platform default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(crate::sira_dirs::data_dir)
    }

    /// Retrieval configuration with a relative `cache_path` anchored under
    /// [`Self::data_dir`], validated.
    ///
    /// # Errors
    ///
    /// Returns [`SiraError::Retrieval`] if the retrieval section is invalid.
    pub fn resolved_retrieval(&self) -> Result<RetrievalConfig> {
        let mut retrieval = self.retrieval.clone();
        if retrieval.cache_path.is_relative() {
            retrieval.cache_path = self.data_dir().join(&retrieval.cache_path);
        }
        retrieval.validate()?;
        Ok(retrieval)
    }

    /// `memory_path`, anchored under [`Self::data_dir`] when relative.
    pub fn resolved_memory_path(&self) -> PathBuf {
        if self.memory_path.is_relative() {
            self.data_dir().join(&self.memory_path)
        } else {
            self.memory_path.clone()
        }
    }
}
