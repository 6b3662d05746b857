/*!
 * Tests for provider construction, request types and the mock provider
 */

use lingocap::app_config::{Config, LlmProvider};
use lingocap::providers::anthropic::AnthropicRequest;
use lingocap::providers::mock::MockProvider;
use lingocap::providers::ollama::Ollama;
use lingocap::providers::openai::OpenAIRequest;
use lingocap::providers::{create_chat_model, ChatModel};

/// Test that the configured provider decides the client
#[test]
fn test_createChatModel_withEachProvider_shouldUseMatchingClient() {
    let mut config = Config::default().punctuation;

    for (provider, name) in [
        (LlmProvider::Ollama, "Ollama"),
        (LlmProvider::OpenAI, "OpenAI"),
        (LlmProvider::Anthropic, "Anthropic"),
        (LlmProvider::LMStudio, "LM Studio"),
    ] {
        config.provider = provider;
        assert_eq!(create_chat_model(&config).name(), name);
    }
}

/// Test the OpenAI request body
#[test]
fn test_openAIRequest_serialize_shouldOmitUnsetOptions() {
    let request = OpenAIRequest::new("gpt-4o-mini")
        .add_message("system", "Punctuate")
        .add_message("user", "hello world");

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["model"], "gpt-4o-mini");
    assert_eq!(json["messages"][1]["content"], "hello world");
    assert!(json.get("temperature").is_none());
    assert_eq!(request.messages().len(), 2);
}

/// Test the Anthropic request body
#[test]
fn test_anthropicRequest_serialize_shouldCarrySystemSeparately() {
    let request = AnthropicRequest::new("claude-3-haiku-20240307", 512)
        .system("Punctuate")
        .add_message("user", "hello world")
        .temperature(0.0);

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["system"], "Punctuate");
    assert_eq!(json["max_tokens"], 512);
    assert_eq!(json["messages"].as_array().map(Vec::len), Some(1));
}

/// Test that a streamed Ollama answer is joined into one message
#[test]
fn test_ollamaParseChatBody_withJsonLines_shouldConcatenateContent() {
    let body = concat!(
        "{\"model\":\"m\",\"message\":{\"role\":\"assistant\",\"content\":\"Hello\"},\"done\":false}\n",
        "{\"model\":\"m\",\"message\":{\"role\":\"assistant\",\"content\":\" world.\"},\"done\":true}\n",
    );

    let response = Ollama::parse_chat_body(body).unwrap();

    assert_eq!(response.message.content, "Hello world.");
    assert!(Ollama::parse_chat_body("not json").is_err());
}

/// Test the mock provider behaviours
#[tokio::test]
async fn test_mockProvider_behaviours_shouldMatchTheirNames() {
    let working = MockProvider::working();
    assert_eq!(working.chat("sys", "hi there", 0.0).await.unwrap(), "hi there.");

    let fixed = MockProvider::replying("Fixed.");
    assert_eq!(fixed.chat("sys", "anything", 0.0).await.unwrap(), "Fixed.");

    assert!(MockProvider::failing().chat("sys", "x", 0.0).await.is_err());
    assert_eq!(MockProvider::empty().chat("sys", "x", 0.0).await.unwrap(), "");

    let flaky = MockProvider::intermittent(2);
    assert!(flaky.chat("sys", "a", 0.0).await.is_ok());
    assert!(flaky.chat("sys", "b", 0.0).await.is_err());
    assert_eq!(flaky.request_count(), 2);
    assert_eq!(flaky.received(), vec!["a".to_string(), "b".to_string()]);
}
