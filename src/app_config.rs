use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::captions::fetcher::DEFAULT_CAPTION_URL_TEMPLATE;
use crate::segmentation::{GapHeuristicConfig, DEFAULT_WINDOW_WORDS};
use crate::template::UrlTemplate;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving the persisted preferences.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Caption language code (ISO)
    #[serde(default = "default_language")]
    pub language: String,

    /// Punctuation restoration settings
    #[serde(default)]
    pub punctuation: PunctuationConfig,

    /// Sentence segmentation settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Overlay style preferences
    #[serde(default)]
    pub display: DisplayConfig,

    /// Replay navigation settings
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Caption source settings
    #[serde(default)]
    pub captions: CaptionSourceConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Language model provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl LlmProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Whether requests need an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" | "lm-studio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: LlmProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
            rate_limit: default_rate_limit(provider_type),
        }
    }
}

/// Punctuation restoration configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PunctuationConfig {
    /// Whether unpunctuated sentences are sent to a language model
    #[serde(default)]
    pub enabled: bool,

    /// Provider to use
    #[serde(default)]
    pub provider: LlmProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: CommonPunctuationConfig,
}

/// Punctuation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommonPunctuationConfig {
    /// Instruction prompt override; the built-in prompt is used when unset
    /// Placeholder: {language}
    #[serde(default)]
    pub prompt: Option<String>,

    /// Temperature parameter for text generation
    #[serde(default)]
    pub temperature: f32,

    /// Minimum delay between two punctuation requests in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Delay before a failed sentence may be requested again, in milliseconds
    #[serde(default = "default_retry_after_ms")]
    pub retry_after_ms: u64,

    /// Retry count for failed HTTP requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for CommonPunctuationConfig {
    fn default() -> Self {
        Self {
            prompt: None,
            temperature: 0.0,
            cooldown_ms: default_cooldown_ms(),
            retry_after_ms: default_retry_after_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Sentence segmentation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmentationConfig {
    /// Words searched on each side of the current word
    #[serde(default = "default_window_words")]
    pub window_words: usize,

    /// Whether commas end sentences
    #[serde(default)]
    pub comma_sentencing: bool,

    /// Gap heuristic tuning for unpunctuated scripts
    #[serde(default)]
    pub gap: GapHeuristicConfig,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            window_words: default_window_words(),
            comma_sentencing: false,
            gap: GapHeuristicConfig::default(),
        }
    }
}

/// Overlay style preferences
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// CSS font family of the overlay
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font size in pixels
    #[serde(default = "default_font_size_px")]
    pub font_size_px: u32,

    /// Emphasize the first half of every word
    #[serde(default)]
    pub bionic_reading: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size_px: default_font_size_px(),
            bionic_reading: false,
        }
    }
}

/// Replay navigation configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NavigationConfig {
    /// Poll interval of the live display in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause automatically at the end of a replayed sentence
    #[serde(default = "default_true")]
    pub auto_pause: bool,

    /// Display updates suppressed after a replay-current command, in milliseconds
    #[serde(default = "default_replay_suppress_ms")]
    pub replay_suppress_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            auto_pause: true,
            replay_suppress_ms: default_replay_suppress_ms(),
        }
    }
}

/// Caption source configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CaptionSourceConfig {
    /// URL template with `videoId` and `lang` variables
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CaptionSourceConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_retry_after_ms() -> u64 {
    10_000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_window_words() -> usize {
    DEFAULT_WINDOW_WORDS
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

fn default_font_size_px() -> u32 {
    24
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_replay_suppress_ms() -> u64 {
    1000
}

fn default_url_template() -> String {
    DEFAULT_CAPTION_URL_TEMPLATE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_model(provider: LlmProvider) -> String {
    match provider {
        LlmProvider::Ollama => "llama3.2:3b".to_string(),
        LlmProvider::OpenAI => "gpt-4o-mini".to_string(),
        LlmProvider::Anthropic => "claude-3-haiku-20240307".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        LlmProvider::LMStudio => "local-model".to_string(),
    }
}

fn default_endpoint(provider: LlmProvider) -> String {
    match provider {
        LlmProvider::Ollama => "http://localhost:11434".to_string(),
        LlmProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        LlmProvider::Anthropic => "https://api.anthropic.com".to_string(),
        LlmProvider::LMStudio => "http://localhost:1234/v1".to_string(),
    }
}

fn default_rate_limit(provider: LlmProvider) -> Option<u32> {
    match provider {
        // Anthropic's standard limit is 50 requests per minute
        LlmProvider::Anthropic => Some(45),
        LlmProvider::OpenAI => Some(60),
        // Local servers are not rate limited
        LlmProvider::Ollama | LlmProvider::LMStudio => None,
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.language)?;

        UrlTemplate::parse(&self.captions.url_template)
            .map_err(|e| anyhow!("Invalid caption URL template: {}", e))?;

        let gap = &self.segmentation.gap;
        if gap.multiplier <= 0.0 {
            return Err(anyhow!("Gap multiplier must be positive, got {}", gap.multiplier));
        }
        if gap.min_gap_ms > gap.max_gap_ms {
            return Err(anyhow!("Gap min_gap_ms ({}) exceeds max_gap_ms ({})", gap.min_gap_ms, gap.max_gap_ms));
        }
        if self.navigation.poll_interval_ms == 0 {
            return Err(anyhow!("Navigation poll interval must be greater than zero"));
        }
        if self.display.font_size_px == 0 {
            return Err(anyhow!("Display font size must be greater than zero"));
        }

        if self.punctuation.enabled {
            let provider = self.punctuation.provider;
            if provider.requires_api_key() && self.punctuation.get_api_key().is_empty() {
                return Err(anyhow!("Punctuation API key is required for {} provider", provider.display_name()));
            }
        }

        Ok(())
    }

    /// Whether commas split sentences
    pub fn punctuation_set(&self) -> crate::captions::PunctuationSet {
        crate::captions::PunctuationSet::new(self.segmentation.comma_sentencing)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            punctuation: PunctuationConfig::default(),
            segmentation: SegmentationConfig::default(),
            display: DisplayConfig::default(),
            navigation: NavigationConfig::default(),
            captions: CaptionSourceConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl PunctuationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &LlmProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a mutable provider configuration, adding a default one when missing
    pub fn provider_config_mut(&mut self, provider_type: LlmProvider) -> &mut ProviderConfig {
        let provider_str = provider_type.to_lowercase_string();
        let index = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(provider_type));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model(self.provider))
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_endpoint(self.provider))
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        match self.get_active_provider_config() {
            Some(provider_config) => provider_config.rate_limit,
            None => default_rate_limit(self.provider),
        }
    }
}

impl Default for PunctuationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LlmProvider::default(),
            available_providers: [LlmProvider::Ollama, LlmProvider::OpenAI, LlmProvider::Anthropic, LlmProvider::LMStudio]
                .into_iter()
                .map(ProviderConfig::new)
                .collect(),
            common: CommonPunctuationConfig::default(),
        }
    }
}
