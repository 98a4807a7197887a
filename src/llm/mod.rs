//! Language model providers behind a single [`ModelClient`] seam.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{ProviderError, Result, ReviewError};
use crate::utils::{with_retry, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Sends one prompt and returns the model's raw text answer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ProviderError>;

    /// Cheap round trip proving the endpoint is reachable and the key is accepted
    async fn health_check(&self) -> std::result::Result<(), ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Maps an HTTP error status from a model provider onto [`ProviderError`]
///
/// `message` is a short, already-sanitised description; raw bodies never go here.
pub fn map_http_status(status: u16, retry_after: Option<Duration>, message: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(message),
        429 => ProviderError::RateLimited { retry_after },
        408 | 504 => ProviderError::Timeout,
        500..=599 => ProviderError::Unavailable(message),
        _ => ProviderError::InvalidRequest(message),
    }
}

/// Upper bound for a single health check
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest `retry-after` hint we keep; larger values are clamped
const MAX_RETRY_AFTER_SECS: f64 = 3600.0;

/// Parses a `retry-after` header given in seconds
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs_f64(secs.min(MAX_RETRY_AFTER_SECS)))
}

/// Wraps a client with a per-attempt timeout and bounded retries
pub struct RetryingModelClient {
    inner: Arc<dyn ModelClient>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl RetryingModelClient {
    pub fn new(inner: Arc<dyn ModelClient>, policy: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            inner,
            policy,
            attempt_timeout,
        }
    }

    async fn attempt(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        match tokio::time::timeout(self.attempt_timeout, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        }
    }
}

#[async_trait]
impl ModelClient for RetryingModelClient {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        debug!(
            "Sending {} chars to {} (max {} retries)",
            prompt.chars().count(),
            self.inner.name(),
            self.policy.max_retries
        );
        with_retry(
            self.policy,
            || self.attempt(prompt),
            ProviderError::is_retryable,
            |e| match e {
                ProviderError::RateLimited { retry_after } => *retry_after,
                _ => None,
            },
        )
        .await
    }

    /// One attempt, no retries
    async fn health_check(&self) -> std::result::Result<(), ProviderError> {
        let limit = self.attempt_timeout.min(HEALTH_TIMEOUT);
        match tokio::time::timeout(limit, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Builds the configured provider, wrapped in the retry policy
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn ModelClient>> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ReviewError::Config(format!("no API key configured for {}", config.provider))
        })?;

    let inner: Arc<dyn ModelClient> = match config.provider {
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(config, api_key)?),
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(config, api_key)),
    };

    info!("Using {} model {}", config.provider, config.model);
    Ok(Arc::new(RetryingModelClient::new(
        inner,
        RetryPolicy::new(config.max_retries, config.retry_base_delay()),
        config.timeout(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use test_case::test_case;

    #[test_case(401, "provider_auth_error")]
    #[test_case(403, "provider_auth_error")]
    #[test_case(429, "provider_rate_limited")]
    #[test_case(408, "provider_timeout")]
    #[test_case(504, "provider_timeout")]
    #[test_case(500, "provider_unavailable")]
    #[test_case(529, "provider_unavailable")]
    #[test_case(400, "provider_invalid_request")]
    #[test_case(413, "provider_invalid_request")]
    fn test_status_mapping(status: u16, kind: &str) {
        assert_eq!(map_http_status(status, None, "x".into()).kind(), kind);
    }

    #[test_case(Some("7"), Some(Duration::from_secs(7)); "whole seconds")]
    #[test_case(Some(" 1.5 "), Some(Duration::from_millis(1500)); "fractional")]
    #[test_case(Some("1e30"), Some(Duration::from_secs(3600)); "huge value is clamped")]
    #[test_case(Some("inf"), None; "infinite")]
    #[test_case(Some("NaN"), None; "not a number")]
    #[test_case(Some("-1"), None; "negative")]
    #[test_case(Some("soon"), None; "text")]
    #[test_case(None, None; "missing")]
    fn test_parse_retry_after(header: Option<&str>, expected: Option<Duration>) {
        assert_eq!(parse_retry_after(header), expected);
    }

    fn fast_retrying(mock: MockModelClient, retries: u32) -> RetryingModelClient {
        RetryingModelClient::new(
            Arc::new(mock),
            RetryPolicy::new(retries, Duration::from_millis(1)),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let mut mock = MockModelClient::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_complete().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ProviderError::Unavailable("overloaded".into()))
            } else {
                Ok("SCORE: 80".to_string())
            }
        });

        let client = fast_retrying(mock, 2);
        assert_eq!(client.complete("prompt").await.unwrap(), "SCORE: 80");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let mut mock = MockModelClient::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_complete()
            .times(1)
            .returning(|_| Err(ProviderError::Auth("invalid key".into())));

        let client = fast_retrying(mock, 3);
        let err = client.complete("prompt").await.unwrap_err();
        assert_eq!(err, ProviderError::Auth("invalid key".into()));
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let mut mock = MockModelClient::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_complete()
            .times(3)
            .returning(|_| Err(ProviderError::RateLimited { retry_after: Some(Duration::from_millis(1)) }));

        let client = fast_retrying(mock, 2);
        assert!(matches!(
            client.complete("prompt").await,
            Err(ProviderError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check_is_not_retried() {
        let mut mock = MockModelClient::new();
        mock.expect_health_check()
            .times(1)
            .returning(|| Err(ProviderError::Unavailable("overloaded".into())));

        let client = fast_retrying(mock, 3);
        assert!(matches!(
            client.health_check().await,
            Err(ProviderError::Unavailable(_))
        ));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig::default();
        assert!(matches!(
            client_from_config(&config),
            Err(ReviewError::Config(_))
        ));
    }
}
