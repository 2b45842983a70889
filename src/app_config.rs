use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application configuration module
/// This module handles the application configuration: defaults, environment
/// overrides, and validation. CLI flags are applied on top by main.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Completion endpoint URL (OpenAI-compatible chat completions route)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "String::new")]
    pub model: String,

    /// Optional chrF scoring endpoint URL; scoring is skipped when unset
    #[serde(default)]
    pub chrf_endpoint: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token ceiling for fixed-budget profiles
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds; doubles after each failed attempt
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Politeness delay between rows in milliseconds
    #[serde(default = "default_row_delay_ms")]
    pub row_delay_ms: u64,

    /// Input column holding the legacy code
    #[serde(default = "default_legacy_col")]
    pub legacy_col: String,

    /// Output column receiving the translated code
    #[serde(default = "default_translated_col")]
    pub translated_col: String,

    /// Input column holding the reference translation for scoring
    #[serde(default = "default_reference_col")]
    pub reference_col: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_endpoint() -> String {
    "http://localhost:8000/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_row_delay_ms() -> u64 {
    100
}

fn default_legacy_col() -> String {
    "legacy_code".to_string()
}

fn default_translated_col() -> String {
    "translated_code".to_string()
}

fn default_reference_col() -> String {
    "Reference".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: String::new(),
            chrf_endpoint: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            timeout_secs: default_timeout_secs(),
            row_delay_ms: default_row_delay_ms(),
            legacy_col: default_legacy_col(),
            translated_col: default_translated_col(),
            reference_col: default_reference_col(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Build a configuration from defaults overlaid with environment
    /// variables (`API_URL`, `MODEL_ID`, `CHRF_URL`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("API_URL") {
            if !endpoint.is_empty() {
                config.endpoint = endpoint;
            }
        }
        if let Ok(model) = std::env::var("MODEL_ID") {
            config.model = model;
        }
        if let Ok(chrf) = std::env::var("CHRF_URL") {
            if !chrf.is_empty() {
                config.chrf_endpoint = Some(chrf);
            }
        }
        config
    }

    /// Validate the configuration before any work starts
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("Invalid completion endpoint URL '{}': {}", self.endpoint, e))?;
        if let Some(chrf) = &self.chrf_endpoint {
            Url::parse(chrf)
                .map_err(|e| anyhow!("Invalid scoring endpoint URL '{}': {}", chrf, e))?;
        }
        if self.max_retries == 0 {
            return Err(anyhow!("max_retries must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be between 0.0 and 2.0"));
        }
        if self.legacy_col == self.translated_col {
            return Err(anyhow!("legacy and translated column names must differ"));
        }
        Ok(())
    }

    /// Name of the score column derived from the translated column
    pub fn score_col(&self) -> String {
        format!("{}_score", self.translated_col)
    }
}
