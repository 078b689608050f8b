//! Configuration loading, validation, and management for Folio.
//!
//! Loads configuration from `~/.folio/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! `AppConfig` is passed explicitly into the gateway; handlers never read
//! the environment themselves.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum length of a plausible API key.
const MIN_API_KEY_LENGTH: usize = 10;

/// The root configuration structure.
///
/// Maps directly to `~/.folio/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer token for the completion API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Deployment mode; production hides internal error detail
    #[serde(default)]
    pub environment: Environment,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Completion API configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Persona storage configuration
    #[serde(default)]
    pub persona: PersonaConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(ConfigError::ValidationError(format!(
                "unknown environment '{other}' (expected 'development' or 'production')"
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Trim a configured key; a blank key counts as unset.
fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("environment", &self.environment)
            .field("gateway", &self.gateway)
            .field("provider", &self.provider)
            .field("persona", &self.persona)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS. `["*"]` mirrors any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on one completion call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Required API key prefix. Empty disables the prefix check.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,

    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,

    #[serde(default = "default_extract_temperature")]
    pub extract_temperature: f32,

    #[serde(default = "default_extract_max_tokens")]
    pub extract_max_tokens: u32,
}

fn default_api_url() -> String {
    "https://router.huggingface.co/hyperbolic/v1".into()
}
fn default_model() -> String {
    "deepseek-ai/DeepSeek-R1".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_key_prefix() -> String {
    "hf_".into()
}
fn default_chat_temperature() -> f32 {
    0.7
}
fn default_chat_max_tokens() -> u32 {
    1000
}
fn default_extract_temperature() -> f32 {
    0.3
}
fn default_extract_max_tokens() -> u32 {
    500
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            key_prefix: default_key_prefix(),
            chat_temperature: default_chat_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            extract_temperature: default_extract_temperature(),
            extract_max_tokens: default_extract_max_tokens(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Path of the persona JSON document
    #[serde(default = "default_persona_path")]
    pub path: PathBuf,
}

fn default_persona_path() -> PathBuf {
    PathBuf::from("chat-backend").join("persona_data.json")
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            path: default_persona_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.folio/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment overrides:
    /// - `FOLIO_API_KEY`, then `HUGGING_FACE_TOKEN` (when no key is configured)
    /// - `FOLIO_ENV` (`development` | `production`)
    /// - `ALLOWED_ORIGINS` (comma-separated)
    /// - `PORT`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.api_key = normalize_key(config.api_key);

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = normalize_key(lookup("FOLIO_API_KEY").or_else(|| lookup("HUGGING_FACE_TOKEN")));
        }

        if let Some(env) = lookup("FOLIO_ENV") {
            self.environment = env.parse()?;
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            let parsed: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.gateway.allowed_origins = parsed;
            }
        }

        if let Some(port) = lookup("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".folio")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("provider.chat_temperature", self.provider.chat_temperature),
            ("provider.extract_temperature", self.provider.extract_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.model must not be empty".into(),
            ));
        }

        if self.gateway.allowed_origins.is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.allowed_origins must list at least one origin (or \"*\")".into(),
            ));
        }

        Ok(())
    }

    /// Check that a usable API key is configured.
    ///
    /// Returns the key on success. A key is malformed when it is shorter
    /// than 10 characters or lacks the configured prefix.
    pub fn credentials(&self) -> Result<&str, CredentialError> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(CredentialError::Missing)?;

        if key.len() < MIN_API_KEY_LENGTH {
            return Err(CredentialError::Malformed(format!(
                "key is shorter than {MIN_API_KEY_LENGTH} characters"
            )));
        }

        let prefix = self.provider.key_prefix.as_str();
        if !prefix.is_empty() && !key.starts_with(prefix) {
            return Err(CredentialError::Malformed(format!(
                "key does not start with '{prefix}'"
            )));
        }

        Ok(key)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: Environment::default(),
            gateway: GatewayConfig::default(),
            provider: ProviderConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Problems with the completion API credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("API key not configured")]
    Missing,

    #[error("API key malformed: {0}")]
    Malformed(String),
}
