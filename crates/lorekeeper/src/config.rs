//! Layered application configuration.

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use lorekeeper_cache::ProfileCacheConfig;
use lorekeeper_core::AnalysisConfig;
use lorekeeper_error::{ConfigError, LorekeeperError, LorekeeperResult};
use lorekeeper_models::ClientSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// Model endpoint settings.
///
/// The API key itself never lives in a config file; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ModelConfig {
    /// API root of an OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    model: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_api_key_env")]
    api_key_env: String,

    /// Reply length limit
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    temperature: f32,

    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    max_retries: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "LOREKEEPER_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_retries() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    /// Client settings with the API key read from `api_key_env`.
    ///
    /// A missing variable leaves the key unset, which suits local endpoints.
    pub fn client_settings(&self) -> LorekeeperResult<ClientSettings> {
        let api_key = std::env::var(&self.api_key_env).ok();
        if api_key.is_none() {
            warn!(variable = %self.api_key_env, "API key variable not set");
        }
        ClientSettings::builder()
            .base_url(self.base_url.clone())
            .model(self.model.clone())
            .api_key(api_key)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .max_retries(self.max_retries)
            .timeout_secs(self.timeout_secs)
            .build()
            .map_err(|e| {
                LorekeeperError::from(ConfigError::new(format!(
                    "Invalid model settings: {}",
                    e
                )))
            })
    }
}

/// Where profiles are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StorageConfig {
    /// Root directory; profiles live under `characters/<name>/profile.json`
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use lorekeeper::LorekeeperConfig;
///
/// let config = LorekeeperConfig::default();
/// assert_eq!(*config.analysis().concurrency(), 5);
/// assert_eq!(config.model().api_key_env(), "LOREKEEPER_API_KEY");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct LorekeeperConfig {
    /// Pipeline settings
    #[serde(default)]
    analysis: AnalysisConfig,

    /// Model endpoint
    #[serde(default)]
    model: ModelConfig,

    /// Profile storage
    #[serde(default)]
    storage: StorageConfig,

    /// Profile cache
    #[serde(default)]
    cache: ProfileCacheConfig,
}

impl LorekeeperConfig {
    /// Load configuration from a single file.
    #[instrument(skip(path))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> LorekeeperResult<Self> {
        debug!(path = %path.as_ref().display(), "Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                LorekeeperError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                LorekeeperError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Sources, later overriding earlier:
    /// 1. Bundled defaults (`lorekeeper.toml` shipped with the crate)
    /// 2. `~/.config/lorekeeper/lorekeeper.toml`
    /// 3. `./lorekeeper.toml`
    ///
    /// Missing user files are skipped.
    #[instrument]
    pub fn load() -> LorekeeperResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../lorekeeper.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/lorekeeper/lorekeeper.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("lorekeeper").required(false));

        let config: Self = builder
            .build()
            .map_err(|e| {
                LorekeeperError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                LorekeeperError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.analysis.validate()?;
        Ok(config)
    }
}
