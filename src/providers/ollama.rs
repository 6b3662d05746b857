use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use reqwest::Client;
use log::error;

use crate::errors::ProviderError;
use super::openai::truncate;
use super::{send_with_retry, ChatModel, Provider, RetryPolicy};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used by the `ChatModel` interface
    model: String,
    /// Retry and rate limit settings
    policy: RetryPolicy,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant, or tool)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Chat response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// Builder methods for ChatRequest
impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: Some(false),
            keep_alive: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete base URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new_with_config(url, RetryPolicy::default(), Duration::from_secs(60))
    }

    /// Create a new Ollama client with configuration
    ///
    /// A bare `host:port` gets an `http://` scheme.
    pub fn new_with_config(endpoint: impl Into<String>, policy: RetryPolicy, timeout: Duration) -> Self {
        let endpoint = endpoint.into();
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint
        } else {
            format!("http://{}", endpoint)
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                // Force HTTP/1.1 - Ollama uses HTTP/1.1
                .http1_only()
                .build()
                .unwrap_or_default(),
            model: String::new(),
            policy,
        }
    }

    /// Set the model used for `ChatModel::chat`
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the Ollama server version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let body = send_with_retry("Ollama", RetryPolicy { max_retries: 0, ..self.policy }, || {
            self.client.get(&url)
        }).await?;

        serde_json::from_str::<VersionResponse>(&body)
            .map(|v| v.version)
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Parse a chat body, tolerating a streamed JSONL answer
    pub fn parse_chat_body(body: &str) -> Result<ChatResponse, ProviderError> {
        match serde_json::from_str::<ChatResponse>(body) {
            Ok(response) => Ok(response),
            Err(e) => {
                // The response might be in JSONL format (streaming response)
                let mut content = String::new();
                let mut last: Option<ChatResponse> = None;
                for line in body.lines().filter(|l| !l.trim().is_empty()) {
                    if let Ok(chunk) = serde_json::from_str::<ChatResponse>(line) {
                        content.push_str(&chunk.message.content);
                        last = Some(chunk);
                    }
                }

                match last {
                    Some(mut response) => {
                        response.message.content = content;
                        Ok(response)
                    }
                    None => {
                        error!("Failed to parse Ollama chat response: {}. Raw response: {}", e, truncate(body, 500));
                        Err(ProviderError::ParseError(e.to_string()))
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = send_with_retry("Ollama", self.policy, || {
            self.client.post(&url).json(&request)
        }).await?;

        Self::parse_chat_body(&body)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &ChatResponse) -> String {
        response.message.content.clone()
    }
}

#[async_trait]
impl ChatModel for Ollama {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn chat(&self, system: &str, user: &str, temperature: f32) -> Result<String, ProviderError> {
        let messages = vec![
            ChatMessage { role: "system".to_string(), content: system.to_string() },
            ChatMessage { role: "user".to_string(), content: user.to_string() },
        ];
        let request = ChatRequest::new(&self.model, messages).temperature(temperature);
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }

    async fn check_connection(&self) -> Result<(), ProviderError> {
        self.test_connection().await
    }
}
