use super::ModelClient;
use crate::config::LlmConfig;
use crate::error::ProviderError;
use async_openai::config::OpenAIConfig;
use async_openai::error::{ApiError, OpenAIError};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat completions client
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));

        // Retries are owned by RetryingModelClient; async-openai must give up immediately
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

/// Classifies an OpenAI API error by its type and code
fn map_api_error(err: &ApiError) -> ProviderError {
    let kind = err.r#type.as_deref().unwrap_or_default();
    let code = err.code.as_deref().unwrap_or_default();

    match (kind, code) {
        // Billing state, not throttling: retrying cannot help
        (_, "insufficient_quota") | ("insufficient_quota", _) => {
            ProviderError::Auth("OpenAI account has no remaining quota".into())
        }
        (_, "rate_limit_exceeded") | ("rate_limit_error", _) => {
            ProviderError::RateLimited { retry_after: None }
        }
        (_, "invalid_api_key") | ("authentication_error", _) | ("permission_error", _) => {
            ProviderError::Auth("OpenAI rejected the API key".into())
        }
        ("server_error", _) | ("service_unavailable", _) | (_, "server_error") => {
            ProviderError::Unavailable("OpenAI server error".into())
        }
        _ => ProviderError::InvalidRequest(format!(
            "OpenAI rejected the request ({})",
            if code.is_empty() { kind } else { code }
        )),
    }
}

fn map_error(err: OpenAIError) -> ProviderError {
    match err {
        OpenAIError::ApiError(api) => {
            warn!(
                "OpenAI API error: type={:?} code={:?}",
                api.r#type, api.code
            );
            map_api_error(&api)
        }
        OpenAIError::Reqwest(e) if e.is_timeout() => ProviderError::Timeout,
        OpenAIError::Reqwest(e) => {
            warn!("OpenAI transport error: {}", e.without_url());
            ProviderError::Unavailable("could not reach OpenAI".into())
        }
        OpenAIError::InvalidArgument(msg) => ProviderError::InvalidRequest(msg),
        other => {
            warn!("OpenAI client error: {}", other);
            ProviderError::Unavailable("unexpected OpenAI client error".into())
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(map_error)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_completion_tokens(self.max_tokens)
            .messages(vec![ChatCompletionRequestMessage::User(message)])
            .build()
            .map_err(map_error)?;

        let response = self.client.chat().create(request).await.map_err(map_error)?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        debug!("OpenAI returned {} chars", text.chars().count());
        Ok(text)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.client.models().list().await.map_err(map_error)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
