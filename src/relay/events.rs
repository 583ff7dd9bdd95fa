//! Wire types for the relay's HTTP surface
//!
//! The stream endpoint emits `data: {"token":"..."}` events followed by
//! the `data: [DONE]` terminal sentinel, or a single
//! `data: {"error":"..."}` event on failure. The sentinel is what
//! distinguishes successful completion from a silent disconnect.

use crate::providers::Message;
use serde::{Deserialize, Serialize};

/// Terminal sentinel written after the last fragment of a successful
/// stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One streamed fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEvent {
    /// Substring to append, in arrival order
    pub token: String,
}

/// Terminal error event; the stream ends right after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Human-readable failure description
    pub error: String,
}

/// Body of `POST /api/chat/stream`
///
/// `messages` is the complete ordered transcript including the new
/// user turn; the caller is the source of truth for ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequest {
    pub messages: Vec<Message>,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Body of `POST /api/chat/session`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Body of `POST /api/chat/session/:session_id/generate-name`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateNameRequest {
    pub messages: Vec<Message>,
}

/// Response of the generate-name endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameResponse {
    pub name: String,
}

/// Lifecycle of one stream request
///
/// Terminal states are not re-enterable; a new send starts a fresh
/// request with its own phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No request in flight
    Idle,
    /// Request accepted, provider call issued
    Sending,
    /// Provider is yielding fragments
    Streaming,
    /// Sentinel delivered, transcript persisted
    Completed,
    /// Error event delivered, nothing persisted
    Failed,
}

impl StreamPhase {
    /// Whether the phase is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
