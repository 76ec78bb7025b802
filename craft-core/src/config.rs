//! Runtime configuration.
//!
//! Values come from the environment (after the binary has loaded `.env`)
//! and may be overridden by command-line flags through the builder methods.

use crate::insight::{Analyzer, ClaudeAnalyzer, OfflineAnalyzer};
use crate::mode::{CraftMode, UnknownMode};
use crate::store::{FileStore, StoreError};
use claude::Claude;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Directory name under the platform data directory.
pub const APP_DIR_NAME: &str = "craft-journal";

/// Errors from building the runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No data directory available - set CRAFT_DATA_DIR")]
    NoDataDir,

    #[error("Invalid CRAFT_MODE: {0}")]
    InvalidMode(#[from] UnknownMode),
}

/// Configuration for a journal session.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the store files and the log file.
    pub data_dir: PathBuf,

    /// Anthropic API key; without one, analysis always falls back.
    pub api_key: Option<String>,

    /// Model override for image analysis.
    pub model: Option<String>,

    /// Craft mode to switch to on startup, overriding the stored one.
    pub mode: Option<CraftMode>,

    /// Never call the analysis service, even with a key.
    pub offline: bool,
}

impl AppConfig {
    /// Create a config rooted at `data_dir` with everything else unset.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            api_key: None,
            model: None,
            mode: None,
            offline: false,
        }
    }

    /// Read `CRAFT_DATA_DIR`, `ANTHROPIC_API_KEY`, `CRAFT_MODEL` and `CRAFT_MODE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match var("CRAFT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR_NAME))
                .ok_or(ConfigError::NoDataDir)?,
        };
        let mode = var("CRAFT_MODE").map(|m| m.parse()).transpose()?;

        Ok(Self {
            data_dir,
            api_key: var("ANTHROPIC_API_KEY"),
            model: var("CRAFT_MODEL"),
            mode,
            offline: false,
        })
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_mode(mut self, mode: CraftMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Path of the log file used by the terminal UI.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("craft.log")
    }

    /// Open the file store under the data directory.
    pub fn open_store(&self) -> Result<FileStore, StoreError> {
        FileStore::open(&self.data_dir)
    }

    /// The analyzer this configuration calls for.
    pub fn analyzer(&self) -> Box<dyn Analyzer> {
        match (&self.api_key, self.offline) {
            (Some(key), false) => {
                let mut client = Claude::new(key.clone());
                if let Some(model) = &self.model {
                    client = client.with_model(model.clone());
                }
                info!(model = client.model(), "image analysis enabled");
                Box::new(ClaudeAnalyzer::new(client))
            }
            _ => {
                info!("image analysis offline, using fallback insights");
                Box::new(OfflineAnalyzer)
            }
        }
    }

    /// Whether analysis requests will reach the service.
    pub fn is_online(&self) -> bool {
        self.api_key.is_some() && !self.offline
    }
}
