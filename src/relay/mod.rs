//! Stream relay for Uplevel
//!
//! The relay is the server component bridging client stream requests
//! to the upstream completion provider. It exposes the chat REST
//! surface plus the SSE stream endpoint, persists finalized
//! transcripts to the session store, and never persists a partial
//! assistant message.

pub mod events;
pub mod routes;

use crate::error::Result;
use crate::providers::Provider;
use crate::session::SessionStore;

use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared state for the relay handlers
///
/// The session store is the only shared mutable resource; each write
/// is scoped to one (user, session) pair.
#[derive(Clone)]
pub struct AppState {
    /// Session persistence
    pub store: Arc<SessionStore>,
    /// Completion gateway
    pub provider: Arc<dyn Provider>,
}

impl AppState {
    /// Bundle a store and provider into relay state
    pub fn new(store: Arc<SessionStore>, provider: Arc<dyn Provider>) -> Self {
        Self { store, provider }
    }
}

/// Build the relay router
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use uplevel::config::OpenAiConfig;
/// use uplevel::providers::OpenAiProvider;
/// use uplevel::relay::{router, AppState};
/// use uplevel::session::SessionStore;
///
/// # fn example() -> uplevel::error::Result<()> {
/// let state = AppState::new(
///     Arc::new(SessionStore::new()?),
///     Arc::new(OpenAiProvider::new(OpenAiConfig::default())?),
/// );
/// let app = router(state);
/// # Ok(())
/// # }
/// ```
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/sessions", get(routes::list_sessions))
        .route("/api/chat/session", post(routes::create_session))
        .route("/api/chat/session/:session_id", delete(routes::delete_session))
        .route(
            "/api/chat/session/:session_id/generate-name",
            post(routes::generate_name),
        )
        .route("/api/chat/history/:session_id", get(routes::get_history))
        .route("/api/chat/stream", post(routes::stream_chat))
        .with_state(state)
}

/// Bind and serve the relay until shutdown
///
/// # Errors
///
/// Returns error if the bind address is invalid or the listener fails.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| crate::error::UplevelError::Config(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Relay listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
