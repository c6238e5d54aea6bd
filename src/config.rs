//! Configuration loading and management for reqsum.
//!
//! Loads settings from `reqsum.toml` with an environment variable override
//! for the API credential. Every setting has a default, so the tool runs
//! with nothing but `ANTHROPIC_API_KEY` set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,
}

/// Model settings for the summarization calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model identifier (e.g., "claude-sonnet-4-20250514")
    #[serde(default = "default_model")]
    pub model: String,
    /// Token budget for each reply; summaries are tiny
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Batch driver pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Save the checkpoint every N new summaries
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Pause between API calls, in milliseconds
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,
}

/// API credential (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub anthropic_key: Option<String>,
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw requirements dump
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Incrementally persisted summaries
    #[serde(default = "default_checkpoint")]
    pub checkpoint: PathBuf,
    /// Final lookup artifact
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_batch_size() -> usize {
    50
}

fn default_sleep_ms() -> u64 {
    100
}

fn default_input() -> PathBuf {
    PathBuf::from("raw_requirements.json")
}

fn default_checkpoint() -> PathBuf {
    PathBuf::from("data/summaries_checkpoint.json")
}

fn default_output() -> PathBuf {
    PathBuf::from("data/requirement_summaries.json")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            sleep_ms: default_sleep_ms(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            checkpoint: default_checkpoint(),
            output: default_output(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            batch: BatchConfig::default(),
            api: ApiConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (reqsum.toml in cwd or
    /// home). A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Override the API credential from the environment
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.api.anthropic_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("reqsum.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("reqsum").join("reqsum.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Get the API credential, or fail with a clear startup error
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .anthropic_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
