use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

use crate::http::{RequestOptions, RetryPolicy};
use crate::llm::{OpenAIImageGenerator, ProviderKind};

/// Environment variable that overrides `chat.default_provider`.
pub const DEFAULT_PROVIDER_ENV: &str = "CHAT_SERVICE_TYPE";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    /// Per-provider overrides keyed by provider identifier.
    #[serde(default)]
    pub providers: HashMap<String, ProviderOverride>,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub vision: VisionConfig,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup(DEFAULT_PROVIDER_ENV).filter(|v| !v.trim().is_empty()) {
            self.chat.default_provider = provider.trim().to_string();
        }
    }

    /// Endpoint overrides from the `providers` section.
    pub fn base_url_overrides(&self) -> Result<Vec<(ProviderKind, String)>, ConfigError> {
        let mut overrides = Vec::new();
        for (id, provider) in &self.providers {
            let kind = id
                .parse::<ProviderKind>()
                .map_err(|_| ConfigError::UnknownProvider(id.clone()))?;
            if let Some(ref base_url) = provider.base_url {
                overrides.push((kind, base_url.clone()));
            }
        }
        Ok(overrides)
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Upper bound for inbound JSON bodies; base64 images are large.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

// ============================================================================
// HttpConfig
// ============================================================================

/// Outbound request settings shared by every provider call.
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            retries: default_retries(),
            backoff_base_ms: default_backoff_base(),
            max_backoff_seconds: default_max_backoff(),
        }
    }
}

impl HttpConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_secs(self.max_backoff_seconds),
        }
    }

    /// Base options for provider calls: per-attempt timeout and retry count.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions::default()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .retries(self.retries)
    }
}

fn default_http_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    30
}

// ============================================================================
// ChatConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    /// Provider used when a request names no model.
    #[serde(default = "default_chat_provider")]
    pub default_provider: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_provider: default_chat_provider(),
        }
    }
}

fn default_chat_provider() -> String {
    ProviderKind::Groq.as_str().to_string()
}

// ============================================================================
// ProviderOverride
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ProviderOverride {
    #[serde(default)]
    pub base_url: Option<String>,
}

// ============================================================================
// ImagesConfig / VisionConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_openai_base")]
    pub base_url: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_quality")]
    pub quality: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            model: default_image_model(),
            quality: default_image_quality(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_openai_base")]
    pub base_url: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            model: default_vision_model(),
        }
    }
}

fn default_openai_base() -> String {
    OpenAIImageGenerator::DEFAULT_BASE_URL.to_string()
}

fn default_image_model() -> String {
    OpenAIImageGenerator::DEFAULT_MODEL.to_string()
}

fn default_image_quality() -> String {
    OpenAIImageGenerator::DEFAULT_QUALITY.to_string()
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

// ============================================================================
// Credentials
// ============================================================================

/// Provider API keys, read once at startup. Empty values count as missing.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let keys = ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                lookup(kind.env_key())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (kind, v))
            })
            .collect();
        Self { keys }
    }

    #[must_use]
    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(kind, key.into());
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn configured(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.keys.contains_key(kind))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("configured", &self.configured().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("unknown provider in config: {0}")]
    UnknownProvider(String),
}

// ============================================================================
// Tests
// ============================================================================
