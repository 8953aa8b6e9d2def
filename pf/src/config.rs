//! pageflow configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::mediator::MediatorConfig;

/// Main pageflow configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Mediator settings
    pub mediator: MediatorConfig,

    /// HTTP loader settings
    pub loader: LoaderConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let content = match config_path {
            Some(path) => fs::read_to_string(path).ok()?,
            None => Self::candidates()
                .into_iter()
                .find(|p| p.exists())
                .and_then(|p| fs::read_to_string(p).ok())?,
        };
        serde_yaml::from_str::<Self>(&content).ok()?.log_level
    }

    /// Project-local `.pageflow.yml`, then `<config dir>/pageflow/pageflow.yml`
    fn candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(".pageflow.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("pageflow").join("pageflow.yml"));
        }
        candidates
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base URL relative routes are resolved against
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Attempts per request before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Largest accepted response body
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,

    /// Fetches of normal priority allowed to run at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            max_attempts: 3,
            timeout_ms: 30_000,
            max_body_bytes: 5 * 1024 * 1024,
            max_concurrent: 4,
        }
    }
}
