/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use lingocap::app_config::{Config, LlmProvider, LogLevel};

/// Test that the default configuration is valid
#[test]
fn test_default_config_shouldValidate() -> Result<()> {
    let config = Config::default();
    config.validate()?;
    assert_eq!(config.language, "en");
    assert_eq!(config.segmentation.window_words, 200);
    assert_eq!(config.navigation.poll_interval_ms, 100);
    assert!(config.navigation.auto_pause);
    Ok(())
}

/// Test that a partial config file falls back to defaults for missing sections
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "language": "ja",
        "segmentation": { "comma_sentencing": true, "gap": { "multiplier": 3.0 } },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.language, "ja");
    assert!(config.segmentation.comma_sentencing);
    assert_eq!(config.segmentation.gap.multiplier, 3.0);
    assert_eq!(config.segmentation.gap.min_gap_ms, 300);
    assert_eq!(config.segmentation.gap.max_gap_ms, 2000);
    assert_eq!(config.punctuation.common.cooldown_ms, 5000);
    assert_eq!(config.log_level, LogLevel::Debug);
    config.validate()?;
    Ok(())
}

/// Test that a default config survives a JSON round trip unchanged in meaning
#[test]
fn test_serialize_defaultConfig_shouldReloadWithSameSettings() -> Result<()> {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config)?;
    let reloaded: Config = serde_json::from_str(&json)?;

    assert_eq!(reloaded.captions.url_template, config.captions.url_template);
    assert_eq!(reloaded.punctuation.provider, config.punctuation.provider);
    assert_eq!(reloaded.display.font_size_px, config.display.font_size_px);
    Ok(())
}

/// Test that hosted providers need an API key once punctuation is enabled
#[test]
fn test_validate_withHostedProviderWithoutKey_shouldFail() {
    let mut config = Config::default();
    config.punctuation.provider = LlmProvider::Anthropic;

    config.punctuation.enabled = false;
    assert!(config.validate().is_ok());

    config.punctuation.enabled = true;
    assert!(config.validate().is_err());

    config.punctuation.provider_config_mut(LlmProvider::Anthropic).api_key = "key".to_string();
    assert!(config.validate().is_ok());
}

/// Test the remaining validation rules
#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.language = "zz-top".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.captions.url_template = "https://host/?v=${videoId".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.segmentation.gap.min_gap_ms = 5000;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.navigation.poll_interval_ms = 0;
    assert!(config.validate().is_err());
}

/// Test that a model override lands in the active provider's entry
#[test]
fn test_providerConfigMut_shouldOverrideModel() {
    let mut config = Config::default();
    config.punctuation.provider = LlmProvider::OpenAI;
    config.punctuation.provider_config_mut(LlmProvider::OpenAI).model = "gpt-4o".to_string();

    assert_eq!(config.punctuation.get_model(), "gpt-4o");
}

/// Test provider name parsing
#[test]
fn test_llmProvider_fromStr_shouldAcceptKnownNames() {
    assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
    assert_eq!("lm-studio".parse::<LlmProvider>().unwrap(), LlmProvider::LMStudio);
    assert!("gemini".parse::<LlmProvider>().is_err());
}
