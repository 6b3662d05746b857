use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::debug;

use crate::errors::ProviderError;
use super::{send_with_retry, ChatModel, Provider, RetryPolicy};

/// OpenAI-compatible chat completions client
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model used by the `ChatModel` interface
    model: String,
    /// Name used in logs
    display_name: String,
    /// Retry and rate limit settings
    policy: RetryPolicy,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    #[serde(default)]
    pub content: String,
}

/// A single completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    /// Generated message
    pub message: OpenAIMessage,

    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    /// Completion choices, the first one is used
    pub choices: Vec<OpenAIChoice>,

    /// Token usage if reported
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Messages added so far
    pub fn messages(&self) -> &[OpenAIMessage] {
        &self.messages
    }
}

impl OpenAI {
    /// Create a new client with default retry settings
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, RetryPolicy::default(), Duration::from_secs(60))
    }

    /// Create a new client with explicit retry settings and timeout
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: String::new(),
            display_name: "OpenAI".to_string(),
            policy,
        }
    }

    /// Set the model used for `ChatModel::chat`
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the name used in logs
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    fn completions_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = self.completions_url();
        let body = send_with_retry(&self.display_name, self.policy, || {
            self.client.post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
        }).await?;

        serde_json::from_str::<OpenAIResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, truncate(&body, 200))))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(&self.model)
            .add_message("user", "Hello")
            .max_tokens(5);
        self.complete(request).await.map(|_| ())
    }

    fn extract_text(response: &OpenAIResponse) -> String {
        response.choices.first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for OpenAI {
    fn name(&self) -> &str {
        &self.display_name
    }

    async fn chat(&self, system: &str, user: &str, temperature: f32) -> Result<String, ProviderError> {
        let request = OpenAIRequest::new(&self.model)
            .add_message("system", system)
            .add_message("user", user)
            .temperature(temperature);

        let response = self.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!("{} usage: {} prompt / {} completion tokens",
                self.display_name, usage.prompt_tokens, usage.completion_tokens);
        }
        if response.choices.is_empty() {
            return Err(ProviderError::ParseError("response contained no choices".to_string()));
        }
        Ok(Self::extract_text(&response))
    }

    async fn check_connection(&self) -> Result<(), ProviderError> {
        self.test_connection().await
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
