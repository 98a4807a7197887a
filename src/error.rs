use std::io;
use std::time::Duration;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Errors that can occur while reviewing a repository
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The repository reference could not be parsed or is not a GitHub repository
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// The repository or file does not exist (or is private)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Source-hosting API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Access to the repository was refused
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Any other GitHub API failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing in the repository survived selection and fetching
    #[error("No analyzable files found in the repository")]
    NoAnalyzableFiles,

    /// The language model provider failed
    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}

/// Failures reported by a language model provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider did not answer within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The provider asked us to slow down
    #[error("rate limited")]
    RateLimited {
        /// Delay suggested by the provider, if any
        retry_after: Option<Duration>,
    },

    /// The provider is down, overloaded or unreachable
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The API key was rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider rejected the request itself; retrying cannot help
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider answered without any text
    #[error("empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited { .. } | Self::Unavailable(_)
        )
    }

    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "provider_timeout",
            Self::RateLimited { .. } => "provider_rate_limited",
            Self::Unavailable(_) => "provider_unavailable",
            Self::Auth(_) => "provider_auth_error",
            Self::InvalidRequest(_) => "provider_invalid_request",
            Self::EmptyResponse => "provider_empty_response",
        }
    }
}

impl ReviewError {
    /// Stable machine-readable tag used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) | Self::Validation(_) => "input_error",
            Self::NotFound(_) => "repository_not_found",
            Self::RateLimitExceeded(_) => "upstream_rate_limited",
            Self::Forbidden(_) => "repository_forbidden",
            Self::GitHubApi(_) | Self::Network(_) | Self::Http(_) | Self::Json(_) => {
                "upstream_fetch_error"
            }
            Self::NoAnalyzableFiles => "no_analyzable_files",
            Self::Provider(e) => e.kind(),
            Self::Config(_) => "config_error",
            Self::IO(_) => "internal_error",
        }
    }

    /// Checks if the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::RateLimitExceeded(_) | Self::Network(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Checks if this error is an input problem detected before any upstream call
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::Validation(_))
    }

    /// A message safe to return to callers: no upstream payloads, no credentials
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidUrl(_) | Self::Validation(_) | Self::NoAnalyzableFiles => self.to_string(),
            Self::NotFound(_) => "Repository not found or not public".to_string(),
            Self::RateLimitExceeded(_) => {
                "GitHub API rate limit exceeded, please try again later".to_string()
            }
            Self::Forbidden(_) => "Access to the repository was denied".to_string(),
            Self::GitHubApi(_) | Self::Network(_) | Self::Http(_) | Self::Json(_) => {
                "Failed to fetch repository contents".to_string()
            }
            Self::Provider(e) => match e {
                ProviderError::Timeout => "The review model timed out, please try again".to_string(),
                ProviderError::RateLimited { .. } => {
                    "The review model is rate limited, please try again later".to_string()
                }
                ProviderError::Unavailable(_) => {
                    "The review model is temporarily unavailable".to_string()
                }
                ProviderError::Auth(_) => "The review model rejected our credentials".to_string(),
                ProviderError::InvalidRequest(_) | ProviderError::EmptyResponse => {
                    "The review model could not process this request".to_string()
                }
            },
            Self::Config(_) | Self::IO(_) => "Internal server error".to_string(),
        }
    }
}
