//! Configuration types for ovtk-adaptor.

use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Model configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Model staging configuration.
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Model configuration.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Name the model is staged and logged under.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Path to the model descriptor (.xml). The weights file sits next to it.
    #[serde(default)]
    pub descriptor_path: Option<String>,

    /// Directory models are staged into.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Device to compile the model for.
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            descriptor_path: None,
            staging_dir: default_staging_dir(),
            device: default_device(),
        }
    }
}

/// Model staging configuration.
#[derive(Debug, Deserialize)]
pub struct LoaderConfig {
    /// How often the staging directory is checked for completion.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long to wait for a staged model to complete.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Chunk size used when staging model files.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl LoaderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_model_name() -> String {
    "model".to_string()
}

fn default_staging_dir() -> String {
    "models".to_string()
}

fn default_device() -> String {
    "CPU".to_string()
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_load_timeout_ms() -> u64 {
    10_000
}

fn default_chunk_size() -> usize {
    1 << 20
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> crate::error::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}
