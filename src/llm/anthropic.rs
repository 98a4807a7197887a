use super::{map_http_status, parse_retry_after, ModelClient};
use crate::config::LlmConfig;
use crate::error::{ProviderError, Result, ReviewError};
use crate::utils::sanitize_api_response;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const HEALTH_PROMPT: &str = "Hi";
const HEALTH_MAX_TOKENS: u32 = 10;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self> {
        // Per-attempt timeouts are enforced by RetryingModelClient
        let client = Client::builder()
            .build()
            .map_err(|e| ReviewError::Config(format!("failed to build HTTP client: {}", e)))?;
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", base),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() || e.is_request() {
        ProviderError::Unavailable("could not reach Anthropic".into())
    } else {
        ProviderError::Unavailable(format!("transport error: {}", e.without_url()))
    }
}

impl AnthropicClient {
    /// Posts one user message; non-2xx answers become a [`ProviderError`]
    async fn send(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> std::result::Result<reqwest::Response, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(
                response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok()),
            );
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Anthropic returned HTTP {}: {}",
                status.as_u16(),
                sanitize_api_response(&text)
            );
            return Err(map_http_status(
                status.as_u16(),
                retry_after,
                format!("Anthropic returned HTTP {}", status.as_u16()),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        let response = self.send(prompt, self.max_tokens).await?;

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            warn!("Unreadable Anthropic response: {}", e.without_url());
            ProviderError::EmptyResponse
        })?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        debug!("Anthropic returned {} chars", text.chars().count());
        Ok(text)
    }

    async fn health_check(&self) -> std::result::Result<(), ProviderError> {
        self.send(HEALTH_PROMPT, HEALTH_MAX_TOKENS).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> AnthropicClient {
        let config = LlmConfig {
            base_url: Some(server.url()),
            ..LlmConfig::default()
        };
        AnthropicClient::new(&config, "sk-ant-test").unwrap()
    }

    #[tokio::test]
    async fn test_complete_joins_text_blocks() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant-test")
            .match_header("anthropic-version", API_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-5-haiku-20241022",
                "max_tokens": 4000,
                "messages": [{"role": "user", "content": "review this"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"SCORE: 85\n"},{"type":"text","text":"SUMMARY: ok"}]}"#,
            )
            .create_async()
            .await;

        let text = client_for(&server).complete("review this").await.unwrap();
        assert_eq!(text, "SCORE: 85\nSUMMARY: ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_header("retry-after", "3")
            .with_body(r#"{"type":"error","error":{"type":"rate_limit_error"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after: Some(std::time::Duration::from_secs(3))
            }
        );
    }

    #[tokio::test]
    async fn test_huge_retry_after_is_clamped() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_header("retry-after", "1e30")
            .create_async()
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after: Some(std::time::Duration::from_secs(3600))
            }
        );
    }

    #[tokio::test]
    async fn test_health_check_sends_tiny_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(Matcher::PartialJson(json!({
                "max_tokens": HEALTH_MAX_TOKENS,
                "messages": [{"role": "user", "content": HEALTH_PROMPT}]
            })))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"Hello"}]}"#)
            .create_async()
            .await;

        assert_eq!(client_for(&server).health_check().await, Ok(()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_health_check_reports_rejected_key() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).health_check().await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));
    }

    #[tokio::test]
    async fn test_error_body_is_not_returned() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"error":{"message":"invalid x-api-key sk-ant-test"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(!err.to_string().contains("sk-ant"));
    }

    #[tokio::test]
    async fn test_empty_content_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert_eq!(err, ProviderError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_overloaded_is_unavailable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .create_async()
            .await;

        let err = client_for(&server).complete("x").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
