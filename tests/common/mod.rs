use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;

use uplevel::config::OpenAiConfig;
use uplevel::providers::OpenAiProvider;
use uplevel::relay::{router, AppState};
use uplevel::session::SessionStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (SessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    let store = SessionStore::new_with_path(db_path).expect("failed to create session store");
    (store, tmp)
}

/// Start a relay on an ephemeral port, backed by a fresh temp store and
/// an OpenAI provider pointed at `api_base` (normally a mock server).
#[allow(dead_code)]
pub async fn spawn_relay(api_base: &str) -> (SocketAddr, Arc<SessionStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = Arc::new(
        SessionStore::new_with_path(tmp.path().join("sessions.db"))
            .expect("failed to create session store"),
    );

    let config = OpenAiConfig {
        api_base: api_base.to_string(),
        api_key: Some("test-key".to_string()),
        ..Default::default()
    };
    let provider = Arc::new(OpenAiProvider::new(config).expect("failed to create provider"));

    let state = AppState::new(store.clone(), provider);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind relay listener");
    let addr = listener.local_addr().expect("listener has no addr");

    tokio::spawn(async move {
        axum::serve(listener, router(state))
            .await
            .expect("relay server failed");
    });

    (addr, store, tmp)
}

/// Build an upstream SSE body from token fragments, optionally
/// terminated with the provider's done sentinel.
#[allow(dead_code)]
pub fn upstream_sse_body(tokens: &[&str], done: bool) -> String {
    let mut body = String::new();
    for token in tokens {
        let chunk = serde_json::json!({
            "choices": [{"delta": {"content": token}}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}
