use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use weft_ai::retry::RetryPolicy;
use weft_ai::{AiBackend, ClaudeBackend, ClaudeConfig, Error, Message};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> ClaudeBackend {
    let config = ClaudeConfig::new("test-key", "claude-test")
        .with_base_url(server.uri())
        .with_retry(RetryPolicy {
            max_retries: 3,
            initial_interval: Duration::from_millis(5),
        });
    ClaudeBackend::new(config).unwrap()
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 1, "output_tokens": 1}
    }))
}

#[tokio::test]
async fn test_generate_sends_headers_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 4096,
            "messages": [
                {"role": "user", "content": "earlier"},
                {"role": "assistant", "content": "reply"},
                {"role": "user", "content": "now"}
            ]
        })))
        .respond_with(text_response("# Result"))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![Message::user("earlier"), Message::assistant("reply")];
    let output = backend(&server).generate("now", &history).await.unwrap();

    assert_eq!(output, "# Result");
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(529))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(text_response("recovered"))
        .mount(&server)
        .await;

    let output = backend(&server).generate("p", &[]).await.unwrap();

    assert_eq!(output, "recovered");
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let err = backend(&server).generate("p", &[]).await.unwrap_err();

    assert!(matches!(err, Error::RateLimited));
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "max_tokens too large"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server).generate("p", &[]).await.unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "invalid_request_error: max_tokens too large");
        }
        other => panic!("unexpected error: {other}"),
    }
}
