//! Integration tests: relay HTTP/WebSocket contract against a mocked Ollama.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use visage::config::{LlmConfig, RelayConfig};
use visage::relay::{AvatarLink, OllamaBackend, RelayServer};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_reply(server: &MockServer, prompt: &str, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"prompt": prompt, "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": reply})))
        .mount(server)
        .await;
}

async fn mock_failure(server: &MockServer, prompt: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"prompt": prompt})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(server)
        .await;
}

async fn start_relay(ollama: &MockServer) -> RelayServer {
    let llm = LlmConfig {
        api_url: ollama.uri(),
        model: "phi3:mini".to_owned(),
        request_timeout_secs: 5,
    };
    let relay = RelayConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        ws_port: 0,
    };
    RelayServer::start(&relay, Arc::new(OllamaBackend::new(&llm)))
        .await
        .expect("relay starts")
}

#[tokio::test]
async fn health_reports_ok() {
    let ollama = MockServer::start().await;
    let relay = start_relay(&ollama).await;

    let body: Value = reqwest::get(format!("http://{}/health", relay.http_addr()))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn chat_returns_model_reply() {
    let ollama = MockServer::start().await;
    mock_reply(&ollama, "hello", "Hi! Nice to meet you.").await;
    let relay = start_relay(&ollama).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/chat", relay.http_addr()))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body, json!({"reply": "Hi! Nice to meet you."}));
}

#[tokio::test]
async fn chat_maps_backend_failure_to_500() {
    let ollama = MockServer::start().await;
    mock_failure(&ollama, "hello").await;
    let relay = start_relay(&ollama).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/chat", relay.http_addr()))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body, json!({"error": "inference request failed"}));
}

#[tokio::test]
async fn chat_answers_cross_origin_preflight() {
    let ollama = MockServer::start().await;
    let relay = start_relay(&ollama).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("http://{}/chat", relay.http_addr()))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .expect("request");
    assert!(resp.status().is_success(), "{}", resp.status());
    let allow_origin = resp
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok());
    assert_eq!(allow_origin, Some("*"));
}

#[tokio::test]
async fn avatar_link_round_trip() {
    let ollama = MockServer::start().await;
    mock_reply(&ollama, "how are you?", "Doing great.").await;
    let relay = start_relay(&ollama).await;

    let mut link = AvatarLink::connect(&relay.ws_url()).await.expect("connect");
    assert!(!link.send_user_message("   ").await.expect("send blank"));
    assert!(link.send_user_message("  how are you?  ").await.expect("send"));

    let reply = tokio::time::timeout(Duration::from_secs(5), link.next_speech())
        .await
        .expect("reply in time")
        .expect("read");
    assert_eq!(reply.as_deref(), Some("Doing great."));
}

#[tokio::test]
async fn non_object_frames_are_prompts_and_other_json_is_ignored() {
    let ollama = MockServer::start().await;
    mock_reply(&ollama, "42", "forty-two").await;
    mock_reply(&ollama, "plain words", "raw ok").await;
    let relay = start_relay(&ollama).await;

    let (mut ws, _) = connect_async(relay.ws_url()).await.expect("connect");
    ws.send(Message::Text(r#"{"type":"ping"}"#.to_owned()))
        .await
        .expect("send ping");
    ws.send(Message::Text("42".to_owned()))
        .await
        .expect("send scalar");
    ws.send(Message::Text("plain words".to_owned()))
        .await
        .expect("send raw");

    for expected in ["forty-two", "raw ok"] {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("reply in time")
            .expect("stream open")
            .expect("frame");
        let text = match frame {
            Message::Text(text) => text,
            other => panic!("expected text frame, got {other:?}"),
        };
        let parsed: Value = serde_json::from_str(&text).expect("json frame");
        assert_eq!(parsed, json!({"type": "avatar_speech", "text": expected}));
    }
}

#[tokio::test]
async fn inference_failure_keeps_connection_open() {
    let ollama = MockServer::start().await;
    mock_failure(&ollama, "first").await;
    mock_reply(&ollama, "second", "still here").await;
    let relay = start_relay(&ollama).await;

    let (mut sender, mut receiver) = AvatarLink::connect(&relay.ws_url())
        .await
        .expect("connect")
        .split();
    sender.send_user_message("first").await.expect("send first");
    sender.send_user_message("second").await.expect("send second");

    let reply = tokio::time::timeout(Duration::from_secs(5), receiver.next_speech())
        .await
        .expect("reply in time")
        .expect("read");
    assert_eq!(reply.as_deref(), Some("still here"));
}

#[tokio::test]
async fn shutdown_closes_avatar_connections() {
    let ollama = MockServer::start().await;
    let relay = start_relay(&ollama).await;
    let mut link = AvatarLink::connect(&relay.ws_url()).await.expect("connect");

    relay.shutdown();
    let next = tokio::time::timeout(Duration::from_secs(5), link.next_speech())
        .await
        .expect("closed in time");
    assert!(matches!(next, Ok(None) | Err(_)), "{next:?}");
}
