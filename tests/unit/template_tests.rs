/*!
 * Tests for the URL template language
 */

use lingocap::captions::fetcher::DEFAULT_CAPTION_URL_TEMPLATE;
use lingocap::captions::HttpCaptionFetcher;
use lingocap::errors::TemplateError;
use lingocap::template::{evaluate, parse_expression, parse_template_all, TemplateContext, TemplatePart, UrlTemplate, Value};

fn eval(source: &str, ctx: &TemplateContext) -> Result<Value, TemplateError> {
    evaluate(&parse_expression(source)?, ctx)
}

/// Test that multiplication binds tighter than addition
#[test]
fn test_evaluate_withMixedOperators_shouldRespectPrecedence() {
    let ctx = TemplateContext::new();

    assert_eq!(eval("1 + 2 * 3", &ctx), Ok(Value::Number(7.0)));
    assert_eq!(eval("(1 + 2) * 3", &ctx), Ok(Value::Number(9.0)));
    assert_eq!(eval("10 - 4 - 3", &ctx), Ok(Value::Number(3.0)));
    assert_eq!(eval("12 / 4 / 3", &ctx), Ok(Value::Number(1.0)));
}

/// Test that numbers render without a trailing fraction when integral
#[test]
fn test_render_withNumbers_shouldPrintIntegersPlainly() {
    let template = UrlTemplate::parse("page=${page + 1}&ratio=${1 / 4}").unwrap();
    let ctx = TemplateContext::new().with("page", 2.0);

    assert_eq!(template.render(&ctx).unwrap(), "page=3&ratio=0.25");
}

/// Test splitting a template into text and placeholders
#[test]
fn test_parseTemplateAll_withPlaceholders_shouldAlternateParts() {
    let parts = parse_template_all("a${x}b${'}'}").unwrap();

    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], TemplatePart::Text("a".to_string()));
    assert!(matches!(parts[1], TemplatePart::Expr(_)));
    assert_eq!(parts[2], TemplatePart::Text("b".to_string()));
    assert!(matches!(parts[3], TemplatePart::Expr(_)));
}

/// Test that a template without placeholders renders unchanged
#[test]
fn test_render_withPlainText_shouldReturnSource() {
    let template = UrlTemplate::parse("https://example.com/captions.json").unwrap();

    assert_eq!(template.render(&TemplateContext::new()).unwrap(), "https://example.com/captions.json");
    assert_eq!(template.source(), "https://example.com/captions.json");
}

/// Test the parse errors
#[test]
fn test_parse_withMalformedInput_shouldFail() {
    assert!(matches!(UrlTemplate::parse("x=${videoId"), Err(TemplateError::Unterminated(2))));
    assert!(parse_expression("1 +").is_err());
    assert!(parse_expression("(1 + 2").is_err());
    assert!(parse_expression("a b").is_err());
    assert!(parse_expression("#").is_err());
}

/// Test evaluation errors
#[test]
fn test_render_withUnboundVariable_shouldFail() {
    let template = UrlTemplate::parse("${videoId}").unwrap();

    let err = template.render(&TemplateContext::new()).unwrap_err();

    assert_eq!(err, TemplateError::UnknownVariable("videoId".to_string()));
    assert!(err.to_string().contains("videoId"));
}

/// Test the default caption URL
#[test]
fn test_urlFor_withDefaultTemplate_shouldEncodeVideoId() {
    let fetcher = HttpCaptionFetcher::new(DEFAULT_CAPTION_URL_TEMPLATE, 5).unwrap();

    let url = fetcher.url_for("a b", "ja").unwrap();

    assert_eq!(url, "https://www.youtube.com/api/timedtext?v=a%20b&lang=ja&fmt=json3");
}

/// Test the language fallback of the default caption URL
#[test]
fn test_urlFor_withEmptyLanguage_shouldFallBackToEnglish() {
    let fetcher = HttpCaptionFetcher::new(DEFAULT_CAPTION_URL_TEMPLATE, 5).unwrap();

    assert!(fetcher.url_for("abc", "").unwrap().ends_with("&lang=en&fmt=json3"));
}

/// Test that an invalid template is rejected when the fetcher is built
#[test]
fn test_httpCaptionFetcher_withInvalidTemplate_shouldFail() {
    assert!(HttpCaptionFetcher::new("https://host/${", 5).is_err());
}
