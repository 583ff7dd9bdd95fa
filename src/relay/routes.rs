//! HTTP handlers for the stream relay
//!
//! REST handlers are thin wrappers over the session store; the stream
//! handler bridges one provider token stream onto one SSE response.
//! User identity arrives on the `x-user-id` header (an auth proxy in
//! front of the relay establishes it; the relay trusts it).

use crate::error::is_not_found;
use crate::prompts::{naming_prompt, sanitize_session_name, MENTOR_SYSTEM_PROMPT};
use crate::providers::{Message, Role};
use crate::relay::events::{
    CreateSessionRequest, ErrorEvent, GenerateNameRequest, NameResponse, StreamPhase,
    StreamRequest, TokenEvent, DONE_SENTINEL,
};
use crate::relay::AppState;
use crate::session::DEFAULT_SESSION_NAME;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use metrics::increment_counter;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Header carrying the authenticated user identity.
pub const USER_HEADER: &str = "x-user-id";

/// Extract the user identity or produce a 401 response
fn require_user(headers: &HeaderMap) -> std::result::Result<String, Response> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

/// Build a JSON error response body `{"message": ...}`
fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// Map a store failure onto 404 or 500
fn store_error_response(err: anyhow::Error) -> Response {
    if is_not_found(&err) {
        error_response(StatusCode::NOT_FOUND, "Session not found")
    } else {
        tracing::error!("Store operation failed: {:#}", err);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
}

/// `GET /api/chat/sessions`
pub async fn list_sessions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state.store.list_sessions(&user) {
        Ok(sessions) => Json(sessions).into_response(),
        Err(err) => store_error_response(err),
    }
}

/// `POST /api/chat/session`
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_SESSION_NAME);

    match state
        .store
        .create_session(&user, name, request.summary.as_deref())
    {
        Ok(session) => Json(session).into_response(),
        Err(err) => store_error_response(err),
    }
}

/// `DELETE /api/chat/session/:session_id` (idempotent)
pub async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state.store.delete_session(&user, &session_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error_response(err),
    }
}

/// `GET /api/chat/history/:session_id`
pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state.store.get_history(&user, &session_id) {
        Ok(messages) => Json(messages).into_response(),
        Err(err) => store_error_response(err),
    }
}

/// `POST /api/chat/stream`
///
/// Opens a `text/event-stream` response and forwards provider
/// fragments as `data: {"token":...}` events as they arrive. On
/// provider completion the `[DONE]` sentinel is written first, then
/// the finalized transcript (posted history plus the concatenated
/// assistant text) is persisted; a client that saw the sentinel is
/// guaranteed the relay had everything it needed to persist. On any
/// failure a single `{"error":...}` event is emitted and nothing is
/// persisted.
pub async fn stream_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StreamRequest>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let last_is_user = request
        .messages
        .last()
        .map(|m| m.role == Role::User && !m.content.trim().is_empty())
        .unwrap_or(false);
    if !last_is_user {
        return error_response(
            StatusCode::BAD_REQUEST,
            "messages must end with a non-empty user turn",
        );
    }

    // Reject unknown or foreign sessions before opening the stream.
    if let Err(err) = state.store.get_history(&user, &request.session_id) {
        return store_error_response(err);
    }

    let stream_id = uuid::Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<Event>(32);

    tokio::spawn(run_stream(state, user, request, stream_id, tx));

    let events = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Sse::new(events).into_response()
}

/// Drive one provider stream onto one SSE channel
///
/// Per-request state lives only here; the relay is stateless across
/// requests.
async fn run_stream(
    state: AppState,
    user: String,
    request: StreamRequest,
    stream_id: uuid::Uuid,
    tx: mpsc::Sender<Event>,
) {
    let mut phase = StreamPhase::Sending;
    increment_counter!("relay_streams_started");
    tracing::debug!(
        "Stream {} started: session={}, {} messages",
        stream_id,
        request.session_id,
        request.messages.len()
    );

    let mut provider_stream = match state
        .provider
        .stream_complete(&request.messages, Some(MENTOR_SYSTEM_PROMPT))
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            fail_stream(&tx, stream_id, &mut phase, err).await;
            return;
        }
    };

    phase = StreamPhase::Streaming;
    let mut assembled = String::new();

    while let Some(item) = provider_stream.next().await {
        match item {
            Ok(token) => {
                assembled.push_str(&token);
                let event = match Event::default().json_data(TokenEvent { token }) {
                    Ok(e) => e,
                    Err(err) => {
                        fail_stream(&tx, stream_id, &mut phase, err.into()).await;
                        return;
                    }
                };
                if tx.send(event).await.is_err() {
                    // Client went away; abandon the turn, persist nothing.
                    tracing::debug!("Stream {} abandoned by client", stream_id);
                    increment_counter!("relay_streams_failed");
                    return;
                }
            }
            Err(err) => {
                fail_stream(&tx, stream_id, &mut phase, err).await;
                return;
            }
        }
    }

    // Sentinel first: the persisted write happens-after the last
    // fragment is delivered, and the client does not block on it. A
    // history read racing this write may briefly see the prior
    // transcript; readers that need the new turn must retry.
    let _ = tx.send(Event::default().data(DONE_SENTINEL)).await;
    phase = StreamPhase::Completed;
    increment_counter!("relay_streams_completed");

    let mut transcript = request.messages;
    transcript.push(Message::assistant(assembled));
    if let Err(err) = state
        .store
        .append_exchange(&user, &request.session_id, &transcript)
    {
        tracing::error!(
            "Stream {} completed but transcript persist failed: {:#}",
            stream_id,
            err
        );
    }

    debug_assert!(phase.is_terminal());
}

/// Emit the terminal error event and record the failure
async fn fail_stream(
    tx: &mpsc::Sender<Event>,
    stream_id: uuid::Uuid,
    phase: &mut StreamPhase,
    err: anyhow::Error,
) {
    tracing::warn!("Stream {} failed: {:#}", stream_id, err);
    *phase = StreamPhase::Failed;
    increment_counter!("relay_streams_failed");

    let event = Event::default()
        .json_data(ErrorEvent {
            error: err.to_string(),
        })
        .unwrap_or_else(|_| Event::default().data("{\"error\":\"stream failed\"}"));
    let _ = tx.send(event).await;
}

/// `POST /api/chat/session/:session_id/generate-name`
///
/// Best-effort: derives a short display name from the opening user
/// message and renames the session. Callers tolerate failure silently;
/// provider errors surface as 502.
pub async fn generate_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(request): Json<GenerateNameRequest>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let first_user_message = request
        .messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone());
    let first_user_message = match first_user_message {
        Some(m) => m,
        None => return error_response(StatusCode::BAD_REQUEST, "no user message to name from"),
    };

    let prompt = naming_prompt(&first_user_message);
    let raw = match state.provider.complete(&[Message::user(prompt)], None).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!("Name generation failed for {}: {:#}", session_id, err);
            return error_response(StatusCode::BAD_GATEWAY, "name generation failed");
        }
    };

    let name = sanitize_session_name(&raw);
    if name.is_empty() {
        return error_response(StatusCode::BAD_GATEWAY, "name generation returned nothing");
    }

    if let Err(err) = state.store.rename(&user, &session_id, &name) {
        return store_error_response(err);
    }

    increment_counter!("relay_names_generated");
    Json(NameResponse { name }).into_response()
}
