mod env_manager;

use crate::error::{Result, ReviewError};
use crate::review::selector::MAX_FILES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub use env_manager::{get_env_value, prompt_missing_api_key};

/// Main configuration struct for the application
///
/// Every section has working defaults, so an empty or missing config file is valid.
/// Values from the environment take precedence over the file (see [`Config::apply_env`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API access
    pub github: GitHubConfig,
    /// Language model provider settings
    pub llm: LlmConfig,
    /// File selection limits
    pub selection: SelectionConfig,
    /// Prompt size budget
    pub prompt: PromptConfig,
    /// Concurrency settings for content fetching
    pub processing: ProcessingConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// GitHub API settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Optional token; raises the API rate limit
    pub token: Option<String>,
    /// REST API base URL
    pub api_base: String,
    /// Timeout for each GitHub request
    pub timeout_secs: u64,
}

/// Supported language model providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ReviewError::Config(format!("unknown LLM provider '{}'", other))),
        }
    }
}

/// Language model settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// API key for the selected provider
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    /// Timeout for a single model attempt
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay; doubles per retry
    pub retry_base_delay_ms: u64,
}

/// File selection limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Files sent to the model; clamped to [`MAX_FILES`]
    pub max_files: usize,
    /// Files larger than this are never selected
    pub max_bytes_per_file: u64,
    /// Files larger than this rank after smaller files of the same tier
    pub large_file_threshold: u64,
}

/// Prompt size budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Ceiling for the whole prompt, in characters
    pub max_chars: usize,
}

/// Configuration for parallel fetch operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of concurrent content fetches
    pub fetch_concurrency: usize,
    /// Per-file fetch timeout
    pub fetch_timeout_secs: u64,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Config {
    /// Loads configuration from the default config file location
    ///
    /// If the config file doesn't exist, returns the default configuration.
    /// Environment overrides are applied in both cases.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Reads a TOML config file without applying environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReviewError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ReviewError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// `{config_dir}/llamareview/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("llamareview").join("config.toml"))
    }

    /// Applies overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(get_env_value);
    }

    /// Applies overrides from an arbitrary lookup; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(base) = lookup("GITHUB_API_BASE_URL") {
            self.github.api_base = base;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            match provider.parse() {
                Ok(provider) => self.llm.provider = provider,
                Err(e) => tracing::warn!("Ignoring LLM_PROVIDER: {}", e),
            }
        }

        let key = match self.llm.provider {
            LlmProvider::Anthropic => {
                lookup("ANTHROPIC_API_KEY").or_else(|| lookup("CLAUDE_API_KEY"))
            }
            LlmProvider::OpenAi => lookup("OPENAI_API_KEY"),
        };
        if let Some(key) = key {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(addr) = lookup("LLAMAREVIEW_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
    }

    /// Checks numeric ranges and addresses
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ReviewError::Config(msg.to_string()));

        if self.selection.max_files == 0 {
            return invalid("selection.max_files must be at least 1");
        }
        if self.selection.max_bytes_per_file == 0 {
            return invalid("selection.max_bytes_per_file must be positive");
        }
        if self.prompt.max_chars < 4096 {
            return invalid("prompt.max_chars must be at least 4096");
        }
        if self.processing.fetch_concurrency == 0 {
            return invalid("processing.fetch_concurrency must be at least 1");
        }
        if self.github.timeout_secs == 0
            || self.processing.fetch_timeout_secs == 0
            || self.llm.timeout_secs == 0
        {
            return invalid("timeouts must be positive");
        }
        if self.llm.max_tokens == 0 {
            return invalid("llm.max_tokens must be positive");
        }
        if self.llm.model.trim().is_empty() {
            return invalid("llm.model must not be empty");
        }
        self.server.socket_addr()?;
        Ok(())
    }

    /// Whether the model provider has what it needs to be called
    pub fn has_api_key(&self) -> bool {
        self.llm
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

impl SelectionConfig {
    /// `max_files` clamped to the hard cap
    pub fn effective_max_files(&self) -> usize {
        self.max_files.min(MAX_FILES)
    }
}

impl ProcessingConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            ReviewError::Config(format!("invalid bind address '{}': {}", self.bind_addr, e))
        })
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() {
        "Some(<redacted>)"
    } else {
        "None"
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &redacted(&self.token))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .finish()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            api_key: None,
            model: "claude-3-5-haiku-20241022".to_string(),
            max_tokens: 4000,
            base_url: None,
            timeout_secs: 120,
            max_retries: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_bytes_per_file: 100 * 1024,
            large_file_threshold: 32 * 1024,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_chars: 120_000 }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 5,
            fetch_timeout_secs: 15,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}
