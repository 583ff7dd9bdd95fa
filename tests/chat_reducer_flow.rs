mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uplevel::chat::{ChatController, RelayClient, SessionRef};
use uplevel::providers::Role;
use uplevel::session::DEFAULT_SESSION_NAME;

async fn mount_stream(upstream: &MockServer, tokens: &[&str], done: bool) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(common::upstream_sse_body(tokens, done), "text/event-stream"),
        )
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_send_flow_drives_state_and_transcript() {
    let upstream = MockServer::start().await;
    mount_stream(
        &upstream,
        &["Del", "egation", " starts", " with", " trust."],
        true,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Delegation basics"}}]
        })))
        .mount(&upstream)
        .await;

    let (addr, _store, _tmp) = common::spawn_relay(&upstream.uri()).await;
    let relay = RelayClient::new(&format!("http://{}", addr), "alice").unwrap();
    let mut controller = ChatController::new(relay);

    controller.new_chat().await.unwrap();
    assert!(controller.state().chat_error.is_none());
    assert!(matches!(
        controller.state().active,
        Some(SessionRef::Confirmed(_))
    ));

    controller.set_input("How do I delegate?");
    assert!(controller.state().can_send());

    let mut tokens = Vec::new();
    controller
        .send_message(|t| tokens.push(t.to_string()))
        .await
        .unwrap();

    assert_eq!(tokens, vec!["Del", "egation", " starts", " with", " trust."]);
    assert!(!controller.state().is_ai_typing);
    assert!(controller.state().streaming_message.is_none());
    assert!(controller.state().chat_error.is_none());
    assert_eq!(controller.state().send_count, 1);
    assert_eq!(controller.state().input, "");

    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(transcript[1].content, "Delegation starts with trust.");

    // First completed exchange renamed the session
    let entry = controller.state().active_entry().unwrap();
    assert_eq!(entry.name, "Delegation basics");
}

#[tokio::test]
async fn test_name_generation_runs_at_most_once() {
    let upstream = MockServer::start().await;
    mount_stream(&upstream, &["ok"], true).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "First question"}}]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let (addr, _store, _tmp) = common::spawn_relay(&upstream.uri()).await;
    let relay = RelayClient::new(&format!("http://{}", addr), "alice").unwrap();
    let mut controller = ChatController::new(relay);
    controller.new_chat().await.unwrap();

    controller.set_input("first");
    controller.send_message(|_| {}).await.unwrap();
    assert_eq!(
        controller.state().active_entry().unwrap().name,
        "First question"
    );

    controller.set_input("second");
    controller.send_message(|_| {}).await.unwrap();
    assert_eq!(controller.state().send_count, 2);
    // MockServer verifies on drop that naming was called exactly once
}

#[tokio::test]
async fn test_name_generation_failure_is_swallowed() {
    let upstream = MockServer::start().await;
    mount_stream(&upstream, &["fine"], true).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let (addr, _store, _tmp) = common::spawn_relay(&upstream.uri()).await;
    let relay = RelayClient::new(&format!("http://{}", addr), "alice").unwrap();
    let mut controller = ChatController::new(relay);
    controller.new_chat().await.unwrap();

    controller.set_input("hello");
    controller.send_message(|_| {}).await.unwrap();

    // The send itself succeeded; the failed rename left no error and
    // the default name in place.
    assert!(controller.state().chat_error.is_none());
    assert_eq!(controller.state().send_count, 1);
    assert_eq!(
        controller.state().active_entry().unwrap().name,
        DEFAULT_SESSION_NAME
    );
}

#[tokio::test]
async fn test_stream_failure_surfaces_error_without_persisting() {
    let upstream = MockServer::start().await;
    mount_stream(&upstream, &["Sure, "], false).await;

    let (addr, _store, _tmp) = common::spawn_relay(&upstream.uri()).await;
    let relay = RelayClient::new(&format!("http://{}", addr), "alice").unwrap();
    let mut controller = ChatController::new(relay);
    controller.new_chat().await.unwrap();

    controller.set_input("hello?");
    controller.send_message(|_| {}).await.unwrap();

    assert!(controller.state().chat_error.is_some());
    assert!(!controller.state().is_ai_typing);
    assert!(controller.state().streaming_message.is_none());
    assert_eq!(controller.state().send_count, 0);
    assert!(
        controller.transcript().is_empty(),
        "a failed stream leaves no transcript entries"
    );
}

#[tokio::test]
async fn test_new_chat_failure_rolls_back_pending_entry() {
    // No relay listening; session creation fails outright
    let relay = RelayClient::new("http://127.0.0.1:9", "alice").unwrap();
    let mut controller = ChatController::new(relay);

    controller.new_chat().await.unwrap();

    assert!(controller.state().sessions.is_empty());
    assert!(controller.state().active.is_none());
    assert!(controller.state().chat_error.is_some());
}

#[tokio::test]
async fn test_delete_last_session_clears_selection() {
    let upstream = MockServer::start().await;
    let (addr, _store, _tmp) = common::spawn_relay(&upstream.uri()).await;
    let relay = RelayClient::new(&format!("http://{}", addr), "alice").unwrap();
    let mut controller = ChatController::new(relay);

    controller.new_chat().await.unwrap();
    let id = controller
        .state()
        .active
        .as_ref()
        .and_then(|s| s.confirmed_id())
        .unwrap()
        .to_string();

    controller.delete_session(&id).await.unwrap();

    assert!(controller.state().sessions.is_empty());
    assert!(controller.state().active.is_none());
    assert!(controller.transcript().is_empty());
}

#[tokio::test]
async fn test_send_without_active_session_sets_error() {
    let relay = RelayClient::new("http://127.0.0.1:9", "alice").unwrap();
    let mut controller = ChatController::new(relay);

    controller.set_input("talking to nobody");
    controller.send_message(|_| {}).await.unwrap();

    assert_eq!(
        controller.state().chat_error.as_deref(),
        Some("no active session")
    );
    assert!(!controller.state().is_ai_typing);
}

#[tokio::test]
async fn test_refresh_sessions_selects_first_when_active_gone() {
    let upstream = MockServer::start().await;
    let (addr, store, _tmp) = common::spawn_relay(&upstream.uri()).await;
    let relay = RelayClient::new(&format!("http://{}", addr), "alice").unwrap();
    let mut controller = ChatController::new(relay);

    let first = store
        .create_session("alice", DEFAULT_SESSION_NAME, None)
        .unwrap();
    let second = store
        .create_session("alice", DEFAULT_SESSION_NAME, None)
        .unwrap();

    controller.refresh_sessions().await.unwrap();
    assert_eq!(
        controller.state().active,
        Some(SessionRef::Confirmed(first.id.clone()))
    );

    // Active session disappears out from under the client
    store.delete_session("alice", &first.id).unwrap();
    controller.refresh_sessions().await.unwrap();
    assert_eq!(
        controller.state().active,
        Some(SessionRef::Confirmed(second.id))
    );
}
