//! HTTP-level tests against a local mock server.

use genai::{Claude, Error, Image, ImageClient, Request, Schema};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Record a short summary
#[derive(Schema, Deserialize, Debug)]
#[schema(name = "record_summary")]
struct Summary {
    /// One-line headline
    headline: String,
    tags: Vec<String>,
}

fn tool_use_body(name: &str, input: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "model": "claude-test",
        "content": [{"type": "tool_use", "id": "toolu_01", "name": name, "input": input}],
        "stop_reason": "tool_use",
        "usage": {"input_tokens": 10, "output_tokens": 20}
    })
}

fn claude(server: &MockServer) -> Claude {
    let base_url = format!("{}/v1", server.uri());
    Claude::new("test-key").with_base_url(base_url)
}

fn images(server: &MockServer) -> ImageClient {
    let base_url = format!("{}/v1", server.uri());
    ImageClient::new("img-key").with_base_url(base_url)
}

#[tokio::test]
async fn test_extract_forces_tool_and_parses_input() {
    let server = MockServer::start().await;
    let input = json!({"headline": "All quiet", "tags": ["calm"]});
    let body = tool_use_body("record_summary", input);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(body_partial_json(json!({
            "tool_choice": {"type": "tool", "name": "record_summary"},
            "tools": [{"name": "record_summary", "description": "Record a short summary"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let summary: Summary = claude(&server)
        .extract(Request::prompt("Summarize"))
        .await
        .expect("extract should succeed");

    assert_eq!(summary.headline, "All quiet");
    assert_eq!(summary.tags, vec!["calm"]);
}

#[tokio::test]
async fn test_extract_rejects_mismatched_input() {
    let server = MockServer::start().await;
    let body = tool_use_body("record_summary", json!({"headline": 42}));

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let result = claude(&server)
        .extract::<Summary>(Request::prompt("Summarize"))
        .await;

    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test]
async fn test_extract_without_tool_call_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_02",
            "model": "claude-test",
            "content": [{"type": "text", "text": "I'd rather not."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        })))
        .mount(&server)
        .await;

    let result = claude(&server)
        .extract::<Summary>(Request::prompt("Summarize"))
        .await;

    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test]
async fn test_api_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = claude(&server).complete(Request::prompt("Hi")).await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 529);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_image_generation_inline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("authorization", "Bearer img-key"))
        .and(body_partial_json(json!({
            "prompt": "a glowing cube",
            "n": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"b64_json": "iVBORw0KGgo="}]
        })))
        .mount(&server)
        .await;

    let image = images(&server)
        .generate("a glowing cube")
        .await
        .expect("image");

    assert_eq!(image.to_uri(), "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn test_image_generation_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad prompt"))
        .mount(&server)
        .await;

    let result = images(&server).generate("???").await;

    assert!(matches!(result, Err(Error::Api { status: 400, .. })));
    assert!(!matches!(result, Ok(Image::Url(_))));
}

#[tokio::test]
async fn test_image_size_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_partial_json(json!({"size": "1024x1792"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://img.example/tall.png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = images(&server).with_size("1024x1792");
    let image = client.generate("a lighthouse").await.expect("image");

    let expected = Image::Url("https://img.example/tall.png".to_string());
    assert_eq!(image, expected);
}
