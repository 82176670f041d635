//! Configuration management for MathForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/<APP_ENV>, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Explanation generator configuration
    #[serde(default)]
    pub explainer: ExplainerConfig,

    /// Conversation log configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Expression extraction configuration
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// Which explanation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainerProvider {
    /// OpenAI-compatible chat completions endpoint
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Deterministic local template
    Mock,
}

impl ExplainerProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplainerProvider::OpenAi => "openai",
            ExplainerProvider::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplainerConfig {
    /// Explanation provider: openai, mock
    #[serde(default = "default_explainer_provider")]
    pub provider: ExplainerProvider,

    /// Chat completions endpoint
    #[serde(default = "default_explainer_endpoint")]
    pub endpoint: String,

    /// API key; without one the mock explainer is used
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_explainer_model")]
    pub model: String,

    /// Maximum tokens per explanation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on one explanation call, in seconds
    #[serde(default = "default_explainer_timeout")]
    pub timeout_secs: u64,

    /// Prior turns passed along as context
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Turns kept per user (0 keeps everything)
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// Treat non-polynomial expressions as "no expression"
    #[serde(default)]
    pub require_polynomial: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Install the Prometheus recorder and serve /metrics
    #[serde(default = "default_enabled")]
    pub metrics_enabled: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_explainer_provider() -> ExplainerProvider { ExplainerProvider::OpenAi }
fn default_explainer_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_explainer_model() -> String { "gpt-4o-mini".to_string() }
fn default_max_tokens() -> u32 { 400 }
fn default_temperature() -> f32 { 0.7 }
fn default_explainer_timeout() -> u64 { 30 }
fn default_context_turns() -> usize { 3 }
fn default_max_turns() -> usize { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "mathforge".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            provider: default_explainer_provider(),
            endpoint: default_explainer_endpoint(),
            api_key: None,
            model: default_explainer_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_explainer_timeout(),
            context_turns: default_context_turns(),
        }
    }
}

impl ExplainerConfig {
    /// Deterministic explainer for tests and offline development
    pub fn mock() -> Self {
        Self {
            provider: ExplainerProvider::Mock,
            ..Self::default()
        }
    }

    /// Get explanation timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_enabled(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__EXPLAINER__API_KEY=sk-...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}
