use mockito::Matcher;
use serde_json::json;

use super::*;
use crate::models::ChatRole;

fn setup_backend(url: &str) -> OpenAI {
    OpenAI::default()
        .with_endpoint(url)
        .with_api_key("test_token")
        .with_referer("http://localhost:5173")
        .with_app_title("Taskpilot")
}

fn stream_body(parts: &[&str]) -> String {
    let mut lines = parts
        .iter()
        .map(|p| {
            format!(
                "data: {}",
                json!({ "choices": [{ "delta": { "content": p }, "finish_reason": null }] })
            )
        })
        .collect::<Vec<_>>();
    lines.push("data: [DONE]".to_string());
    lines.join("\n\n")
}

#[tokio::test]
async fn test_stream_chat() {
    let mut server = mockito::Server::new_async().await;
    let completion_handler = server
        .mock("POST", "/chat/completions")
        .match_header("Authorization", "Bearer test_token")
        .match_header("HTTP-Referer", "http://localhost:5173")
        .match_header("X-Title", "Taskpilot")
        .match_body(Matcher::PartialJson(json!({
            "model": "openai/gpt-4",
            "messages": [{ "role": "user", "content": "Hi" }],
            "max_tokens": 2048,
            "top_p": 1.0,
            "frequency_penalty": 0.0,
            "presence_penalty": 0.0,
            "stream": true,
        })))
        .with_status(200)
        .with_header("Content-Type", "text/event-stream")
        .with_body(stream_body(&["Hel", "lo"]))
        .create_async()
        .await;

    let backend = setup_backend(&server.url());
    let mut text = String::new();
    let outcome = backend
        .stream_chat(
            &[ChatMessage::user("Hi")],
            "openai/gpt-4",
            0.7,
            &mut |chunk: &str| text.push_str(chunk),
        )
        .await
        .expect("Failed to stream completion");

    assert_eq!(text, "Hello");
    assert_eq!(outcome, StreamOutcome::Done);
    completion_handler.assert_async().await;
}

#[tokio::test]
async fn test_stream_chat_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"No auth credentials found","code":401}}"#)
        .create_async()
        .await;

    let backend = setup_backend(&server.url());
    let mut called = false;
    let err = backend
        .stream_chat(
            &[ChatMessage::user("Hi")],
            "openai/gpt-4",
            0.7,
            &mut |_: &str| called = true,
        )
        .await
        .unwrap_err();

    let err = err
        .downcast_ref::<GatewayError>()
        .expect("expected a gateway error");
    assert_eq!(err.http_code, 401);
    assert!(err.body.contains("No auth credentials found"));
    assert!(!called);
}

#[tokio::test]
async fn test_send_chat() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                { "role": "system", "content": "Be brief" },
                { "role": "user", "content": "Hi" },
            ],
            "stream": false,
        })))
        .with_status(200)
        .with_body(
            json!({
                "id": "gen-1",
                "choices": [{
                    "message": { "role": "assistant", "content": "Hello!" },
                    "finish_reason": "stop",
                }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 },
            })
            .to_string(),
        )
        .create_async()
        .await;

    let backend = setup_backend(&server.url());
    let answer = backend
        .send_chat(
            &[ChatMessage::system("Be brief"), ChatMessage::user("Hi")],
            "openai/gpt-4",
            0.7,
        )
        .await
        .unwrap();
    assert_eq!(answer, "Hello!");
    handler.assert_async().await;
}

#[tokio::test]
async fn test_send_chat_without_choices() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"id":"gen-1","choices":[]}"#)
        .create_async()
        .await;

    let backend = setup_backend(&server.url());
    let res = backend
        .send_chat(&[ChatMessage::user("Hi")], "openai/gpt-4", 0.7)
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_no_model() {
    let backend = setup_backend("http://127.0.0.1:1");
    let res = backend.send_chat(&[ChatMessage::user("Hi")], "", 0.7).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_validate_api_key() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", "/chat/completions")
        .match_header("Authorization", "Bearer good")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}]}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/chat/completions")
        .match_header("Authorization", "Bearer bad")
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let good = OpenAI::default()
        .with_endpoint(&server.url())
        .with_api_key("good");
    assert!(good.validate_api_key().await);
    ok.assert_async().await;

    let bad = OpenAI::default()
        .with_endpoint(&server.url())
        .with_api_key("bad");
    assert!(!bad.validate_api_key().await);
}

#[test]
fn test_from_gateway_config() {
    let config = GatewayConfig {
        endpoint: "https://gateway.example.com/api/v1/".to_string(),
        api_key: Some("sk-test".to_string()),
        max_tokens: 1024,
        timeout_secs: Some(30),
        ..Default::default()
    };

    let backend = OpenAI::from(&config);
    assert_eq!(backend.endpoint(), "https://gateway.example.com/api/v1");
    assert_eq!(backend.api_key(), Some("sk-test"));
    assert_eq!(backend.max_tokens(), 1024);
    assert_eq!(backend.timeout(), Some(time::Duration::from_secs(30)));
    assert_eq!(backend.name(), "OpenRouter");
}

#[test]
fn test_new_backend_requires_api_key() {
    let mut config = GatewayConfig::default();
    assert!(crate::backend::new_backend(&config).is_err());

    config.api_key = Some(String::new());
    assert!(crate::backend::new_backend(&config).is_err());

    config.api_key = Some("sk-test".to_string());
    assert!(crate::backend::new_backend(&config).is_ok());
}

#[test]
fn test_chat_message_wire_role() {
    let msg = ChatMessage::new(ChatRole::Assistant, "hi");
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({ "role": "assistant", "content": "hi" })
    );
}
