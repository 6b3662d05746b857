/*!
 * Provider implementations for language-model chat endpoints.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI-compatible chat completions (also used for LM Studio)
 * - Anthropic: Anthropic messages API
 * - Ollama: Local LLM server
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use log::{error, warn};
use reqwest::{RequestBuilder, StatusCode};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{LlmProvider, PunctuationConfig};
use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the typed interface of each provider client, with
/// provider-specific request and response types.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Provider-agnostic single-turn chat used by the punctuation augmenter
#[async_trait]
pub trait ChatModel: Send + Sync + Debug {
    /// Human readable provider name for logs
    fn name(&self) -> &str;

    /// Send a system instruction and one user message, returning the reply text
    async fn chat(&self, system: &str, user: &str, temperature: f32) -> Result<String, ProviderError>;

    /// Check that the endpoint answers before a batch of requests
    async fn check_connection(&self) -> Result<(), ProviderError>;
}

/// Retry settings shared by the HTTP clients
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
    /// Optional rate limit in requests per minute
    pub rate_limit: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limit: None,
        }
    }
}

/// Send a request built by `build`, retrying network failures and 5xx answers.
///
/// Client errors are returned immediately. On success the raw body is returned.
pub(crate) async fn send_with_retry<F>(
    provider_name: &str,
    policy: RetryPolicy,
    build: F,
) -> Result<String, ProviderError>
where
    F: Fn() -> RequestBuilder + Send + Sync,
{
    let mut attempt = 0;
    let mut last_error = None;

    while attempt <= policy.max_retries {
        if attempt > 0 {
            if let Some(rate_limit) = policy.rate_limit.filter(|r| *r > 0) {
                tokio::time::sleep(Duration::from_millis(60_000 / rate_limit as u64)).await;
            }
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await
                    .unwrap_or_else(|_| "Failed to get response text".to_string());

                if status.is_success() {
                    return Ok(body);
                }

                if status.is_server_error() {
                    error!("{} API error ({}): {} - attempt {}/{}",
                        provider_name, status, body, attempt + 1, policy.max_retries + 1);
                    last_error = Some(ProviderError::ApiError { status_code: status.as_u16(), message: body });
                } else {
                    error!("{} API error ({}): {}", provider_name, status, body);
                    return Err(map_client_error(status, body));
                }
            }
            Err(e) => {
                warn!("{} network error: {} - attempt {}/{}", provider_name, e, attempt + 1, policy.max_retries + 1);
                last_error = Some(ProviderError::ConnectionError(e.to_string()));
            }
        }

        attempt += 1;

        // If we have more retries left, wait with exponential backoff
        if attempt <= policy.max_retries {
            let backoff_ms = policy.backoff_base_ms * (1u64 << (attempt - 1).min(16));
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        ProviderError::RequestFailed(format!("{} request failed after {} attempts", provider_name, policy.max_retries + 1))
    }))
}

fn map_client_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError { status_code: status.as_u16(), message: body },
    }
}

/// Build the chat model selected by the punctuation configuration
pub fn create_chat_model(config: &PunctuationConfig) -> Arc<dyn ChatModel> {
    let policy = RetryPolicy {
        max_retries: config.common.retry_count,
        backoff_base_ms: config.common.retry_backoff_ms,
        rate_limit: config.get_rate_limit(),
    };
    let timeout = Duration::from_secs(config.get_timeout_secs());
    let model = config.get_model();

    match config.provider {
        LlmProvider::OpenAI => Arc::new(
            openai::OpenAI::new_with_config(config.get_api_key(), config.get_endpoint(), policy, timeout)
                .with_model(model),
        ),
        LlmProvider::LMStudio => {
            // LM Studio often doesn't require an API key; use a default if empty
            let api_key = {
                let k = config.get_api_key();
                if k.is_empty() { "lm-studio".to_string() } else { k }
            };
            Arc::new(
                openai::OpenAI::new_with_config(api_key, config.get_endpoint(), policy, timeout)
                    .with_model(model)
                    .with_display_name("LM Studio"),
            )
        }
        LlmProvider::Anthropic => Arc::new(
            anthropic::Anthropic::new_with_config(config.get_api_key(), config.get_endpoint(), policy, timeout)
                .with_model(model),
        ),
        LlmProvider::Ollama => Arc::new(
            ollama::Ollama::new_with_config(config.get_endpoint(), policy, timeout)
                .with_model(model),
        ),
    }
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
