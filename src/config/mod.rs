pub mod validation;

use serde::{Deserialize, Serialize};

use self::validation::validate_config;

pub const ENV_MOCK_MODE: &str = "MOCK_FIREWORKS";
pub const ENV_API_KEY: &str = "FIREWORKS_API_KEY";
pub const ENV_LOG_LEVEL: &str = "PLAYGROUND_LOG_LEVEL";

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Upstream request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_http_pool_max_idle_per_host")]
    pub http_pool_max_idle_per_host: usize,
    #[serde(default = "default_models_cache_ttl_secs")]
    pub models_cache_ttl_secs: u64,
    #[serde(default)]
    pub base_path: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_timeout() -> u64 {
    180
}
fn default_http_pool_max_idle_per_host() -> usize {
    16
}
fn default_models_cache_ttl_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            timeout: default_timeout(),
            http_pool_max_idle_per_host: default_http_pool_max_idle_per_host(),
            models_cache_ttl_secs: default_models_cache_ttl_secs(),
            base_path: String::new(),
        }
    }
}

/// Upstream model API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Serve canned responses instead of calling the hosted API.
    #[serde(default)]
    pub mock: bool,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_models_url")]
    pub models_url: String,
    #[serde(default = "default_mock_initial_delay_ms")]
    pub mock_initial_delay_ms: u64,
    #[serde(default = "default_mock_word_delay_ms")]
    pub mock_word_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://api.fireworks.ai/inference/v1".to_string()
}
fn default_models_url() -> String {
    "https://app.fireworks.ai/api/models/mini-playground".to_string()
}
fn default_mock_initial_delay_ms() -> u64 {
    100
}
fn default_mock_word_delay_ms() -> u64 {
    50
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mock: false,
            api_key: None,
            base_url: default_base_url(),
            models_url: default_models_url(),
            mock_initial_delay_ms: default_mock_initial_delay_ms(),
            mock_word_delay_ms: default_mock_word_delay_ms(),
        }
    }
}

impl UpstreamConfig {
    /// The configured credential, ignoring blank values.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl AppConfig {
    /// Apply `MOCK_FIREWORKS`, `FIREWORKS_API_KEY` and `PLAYGROUND_LOG_LEVEL`
    /// from the given variable lookup on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mock) = lookup(ENV_MOCK_MODE) {
            self.upstream.mock = mock.trim().eq_ignore_ascii_case("true");
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.upstream.api_key = Some(api_key);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.features.log_level = level;
        }
    }
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration for the server binary.
///
/// A missing file falls back to defaults; process environment overrides are
/// applied last and the result is validated again.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be read or parsed,
/// or when the merged configuration is invalid.
pub fn load_config_with_env(path: &str) -> Result<AppConfig, ConfigError> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            AppConfig::default()
        }
        Err(err) => return Err(err),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());
    validate_config(&config)?;
    Ok(config)
}
