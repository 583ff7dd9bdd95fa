//! HTTP client for the relay API
//!
//! Thin wrapper over `reqwest` that speaks the relay's JSON endpoints
//! and its server-sent event stream. Every request carries the
//! `x-user-id` header; the relay scopes all session access by it.

use futures::StreamExt;
use reqwest::StatusCode;

use crate::error::{Result, UplevelError};
use crate::providers::Message;
use crate::relay::events::{
    CreateSessionRequest, ErrorEvent, GenerateNameRequest, NameResponse, StreamRequest,
    TokenEvent, DONE_SENTINEL,
};
use crate::relay::routes::USER_HEADER;
use crate::session::SessionSummary;

/// Client for one relay endpoint, bound to one user id
#[derive(Debug)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl RelayClient {
    /// Create a new client for a relay base URL and user id
    pub fn new(base_url: &str, user_id: &str) -> Result<Self> {
        if user_id.trim().is_empty() {
            return Err(UplevelError::NotAuthenticated.into());
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success relay response to a typed error
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = match status {
            StatusCode::UNAUTHORIZED => UplevelError::NotAuthenticated,
            StatusCode::NOT_FOUND => UplevelError::NotFound(body),
            _ => UplevelError::Relay(format!("relay returned {}: {}", status, body)),
        };
        Err(err.into())
    }

    /// List this user's sessions, oldest first
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let response = self
            .client
            .get(self.url("/api/chat/sessions"))
            .header(USER_HEADER, &self.user_id)
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }

    /// Create a session, optionally with a name and summary
    pub async fn create_session(
        &self,
        name: Option<&str>,
        summary: Option<&str>,
    ) -> Result<SessionSummary> {
        let body = CreateSessionRequest {
            name: name.map(str::to_string),
            summary: summary.map(str::to_string),
        };
        let response = self
            .client
            .post(self.url("/api/chat/session"))
            .header(USER_HEADER, &self.user_id)
            .json(&body)
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }

    /// Delete a session; deleting an unknown id succeeds
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/chat/session/{}", session_id)))
            .header(USER_HEADER, &self.user_id)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// Fetch the persisted message history of a session
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let response = self
            .client
            .get(self.url(&format!("/api/chat/history/{}", session_id)))
            .header(USER_HEADER, &self.user_id)
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }

    /// Ask the relay to generate and persist a name for a session
    pub async fn generate_name(&self, session_id: &str, messages: &[Message]) -> Result<String> {
        let body = GenerateNameRequest {
            messages: messages.to_vec(),
        };
        let response = self
            .client
            .post(self.url(&format!(
                "/api/chat/session/{}/generate-name",
                session_id
            )))
            .header(USER_HEADER, &self.user_id)
            .json(&body)
            .send()
            .await?;
        let response = self.check(response).await?;
        let named: NameResponse = response.json().await?;
        Ok(named.name)
    }

    /// Stream a completion for `messages` into `on_token`
    ///
    /// Returns once the relay sends its terminal sentinel. A relay-side
    /// error event becomes a provider error; a connection that drops
    /// before the sentinel becomes a transport error, and the caller
    /// must treat any tokens already received as unpersisted.
    pub async fn stream_chat(
        &self,
        messages: &[Message],
        session_id: &str,
        mut on_token: impl FnMut(&str),
    ) -> Result<()> {
        let body = StreamRequest {
            messages: messages.to_vec(),
            session_id: session_id.to_string(),
        };
        let response = self
            .client
            .post(self.url("/api/chat/stream"))
            .header(USER_HEADER, &self.user_id)
            .json(&body)
            .send()
            .await?;
        let response = self.check(response).await?;

        let mut byte_stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(|e| {
                UplevelError::TransportInterrupted(format!("stream read failed: {}", e))
            })?;
            buffer.extend_from_slice(&chunk);

            for event in drain_event_blocks(&mut buffer) {
                for line in event.lines() {
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == DONE_SENTINEL {
                        return Ok(());
                    }
                    if let Ok(token) = serde_json::from_str::<TokenEvent>(data) {
                        on_token(&token.token);
                    } else if let Ok(err) = serde_json::from_str::<ErrorEvent>(data) {
                        return Err(UplevelError::Provider(err.error).into());
                    }
                }
            }
        }

        Err(UplevelError::TransportInterrupted(
            "stream ended before terminal sentinel".to_string(),
        )
        .into())
    }
}

/// Drain complete SSE event blocks from a raw byte buffer
///
/// Events are separated by a blank line; the separator is ASCII, so
/// splitting at the byte level never cuts through a multibyte
/// character even when transport chunk boundaries do. Bytes after the
/// last separator stay in the buffer for the next chunk.
fn drain_event_blocks(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut events = Vec::new();
    while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
        let block: Vec<u8> = buffer.drain(..pos + 2).collect();
        events.push(String::from_utf8_lossy(&block[..pos]).into_owned());
    }
    events
}
