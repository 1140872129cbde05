//! Configuration loading and validation for hoploop.
//!
//! Loads configuration from `~/.hoploop/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hoploop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name, used in logs
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for every predictor call
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Tool loop settings
    #[serde(default)]
    pub react: ReactConfig,

    /// Code loop settings
    #[serde(default)]
    pub program_of_thought: ProgramOfThoughtConfig,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("react", &self.react)
            .field("program_of_thought", &self.program_of_thought)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactConfig {
    /// Hop ceiling
    #[serde(default = "default_react_max_iters")]
    pub max_iters: usize,

    /// Passages returned per `Search` call
    #[serde(default = "default_num_results")]
    pub num_results: usize,

    /// Passage corpus for the `Search` tool (text or JSONL, one per line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,

    /// Register the `Calculate` tool
    #[serde(default = "default_true")]
    pub calculator: bool,
}

fn default_react_max_iters() -> usize {
    5
}
fn default_num_results() -> usize {
    3
}
fn default_true() -> bool {
    true
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            max_iters: default_react_max_iters(),
            num_results: default_num_results(),
            corpus_path: None,
            calculator: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramOfThoughtConfig {
    /// Total execution attempts (one generate plus regenerations)
    #[serde(default = "default_pot_max_iters")]
    pub max_iters: usize,

    /// Modules generated code may import
    #[serde(default = "default_import_whitelist")]
    pub import_whitelist: Vec<String>,

    /// Interpreter command for the sandbox
    #[serde(default = "default_python_command")]
    pub python_command: String,

    /// Kill the interpreter after this many seconds (no limit when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_timeout_secs: Option<u64>,
}

fn default_pot_max_iters() -> usize {
    3
}
fn default_import_whitelist() -> Vec<String> {
    vec![
        "math".into(),
        "datetime".into(),
        "fractions".into(),
        "statistics".into(),
    ]
}
fn default_python_command() -> String {
    "python3".into()
}

impl Default for ProgramOfThoughtConfig {
    fn default() -> Self {
        Self {
            max_iters: default_pot_max_iters(),
            import_whitelist: default_import_whitelist(),
            python_command: default_python_command(),
            exec_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hoploop/config.toml).
    ///
    /// Also checks environment variables:
    /// - `HOPLOOP_API_KEY` (highest priority), `OPENROUTER_API_KEY`, `OPENAI_API_KEY`
    /// - `HOPLOOP_MODEL`
    /// - `HOPLOOP_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("HOPLOOP_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("HOPLOOP_MODEL") {
            config.model = model;
        }

        if let Ok(base_url) = std::env::var("HOPLOOP_BASE_URL") {
            config.base_url = base_url;
        }

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

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hoploop")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.react.max_iters == 0 {
            return Err(ConfigError::ValidationError(
                "react.max_iters must be at least 1".into(),
            ));
        }

        if self.react.num_results == 0 {
            return Err(ConfigError::ValidationError(
                "react.num_results must be at least 1".into(),
            ));
        }

        if self.program_of_thought.max_iters == 0 {
            return Err(ConfigError::ValidationError(
                "program_of_thought.max_iters must be at least 1".into(),
            ));
        }

        if self.program_of_thought.python_command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "program_of_thought.python_command must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            react: ReactConfig::default(),
            program_of_thought: ProgramOfThoughtConfig::default(),
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
