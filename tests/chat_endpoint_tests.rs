//! Chatbot endpoint tests against a mocked HTTP server

mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use voicechat::chat::{ChatBackend, ChatPipeline, ChatbaseClient};
use voicechat::config::ChatConfig;
use voicechat::messages::Role;
use voicechat::ui::AppState;
use voicechat::{VoiceChatError, CHAT_ERROR_MESSAGE};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ChatConfig {
    ChatConfig::new(format!("{}/api/v1/chat", server.uri()))
        .with_api_token("test-token")
        .with_chatbot_id("bot-123")
}

async fn client_for(server: &MockServer) -> ChatbaseClient {
    ChatbaseClient::new(config_for(server)).unwrap()
}

/// Poll the state like the view does until the pending request settles
async fn settle(state: &mut AppState) {
    for _ in 0..200 {
        state.poll_events();
        if !state.is_loading() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("request never completed");
}

fn connected_state(server: &MockServer) -> (AppState, std::thread::JoinHandle<()>) {
    let client = ChatbaseClient::new(config_for(server)).unwrap();
    let pipeline = ChatPipeline::new(Arc::new(client));
    let command_tx = pipeline.command_sender();
    let event_rx = pipeline.event_receiver();
    let worker = pipeline.start_worker().unwrap();

    let (state, _, _) = common::scripted_state();
    (state.with_chat(command_tx, event_rx), worker)
}

#[tokio::test]
async fn test_request_carries_user_text_and_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "What is Rust?"}],
            "chatbotId": "bot-123",
            "stream": false,
            "model": "gpt-3.5-turbo"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "A language."})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).await.send("What is Rust?").await.unwrap();
    assert_eq!(reply, "A language.");
}

#[tokio::test]
async fn test_chat_completions_shape_is_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello, world."}}]
        })))
        .mount(&server)
        .await;

    let reply = client_for(&server).await.send("hi").await.unwrap();
    assert_eq!(reply, "Hello, world.");
}

#[tokio::test]
async fn test_server_error_is_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    match client_for(&server).await.send("hello").await {
        Err(VoiceChatError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unexpected_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "wrong field"})))
        .mount(&server)
        .await;

    let result = client_for(&server).await.send("hello").await;
    assert!(matches!(result, Err(VoiceChatError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_empty_reply_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "   "})))
        .mount(&server)
        .await;

    let result = client_for(&server).await.send("hello").await;
    assert!(matches!(result, Err(VoiceChatError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let config = ChatConfig::new("http://127.0.0.1:9/api/v1/chat").with_timeout(Duration::from_secs(2));
    let client = ChatbaseClient::new(config).unwrap();

    let error = client.send("hello").await.unwrap_err();
    assert!(matches!(error, VoiceChatError::Transport(_)));
    assert_eq!(error.user_message(), CHAT_ERROR_MESSAGE);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submit_hello_gets_hi_there() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hi there"})))
        .expect(1)
        .mount(&server)
        .await;

    let (mut state, _worker) = connected_state(&server);
    state.input_text = "hello".into();
    state.submit();
    assert!(state.is_loading());

    settle(&mut state).await;

    let messages = state.messages.get_all();
    assert_eq!(messages.len(), 2);
    assert_eq!((messages[0].role, messages[0].content.as_str()), (Role::User, "hello"));
    assert_eq!(
        (messages[1].role, messages[1].content.as_str()),
        (Role::Assistant, "hi there")
    );
    assert!(state.input_text.is_empty());
    assert!(state.last_error.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submit_hello_with_server_error_shows_banner() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut state, _worker) = connected_state(&server);
    state.input_text = "hello".into();
    state.submit();

    settle(&mut state).await;

    assert!(state.messages.is_empty());
    assert_eq!(state.last_error.as_deref(), Some(CHAT_ERROR_MESSAGE));
    assert!(!state.is_loading());
}
