//! Terminal chat client
//!
//! The controller owns the [`ChatState`] record and a transcript of
//! the active session. All user-visible transitions flow through the
//! pure [`reduce`] function; the controller's async methods perform the
//! relay I/O and dispatch actions around it.

pub mod client;
pub mod state;

pub use client::RelayClient;
pub use state::{reduce, ChatAction, ChatState, SessionEntry, SessionRef};

use crate::error::Result;
use crate::providers::Message;
use crate::session::DEFAULT_SESSION_NAME;

/// Drives one user's chat against a relay
pub struct ChatController {
    state: ChatState,
    transcript: Vec<Message>,
    relay: RelayClient,
    next_temp_id: u64,
}

impl ChatController {
    /// Create a controller with empty state
    pub fn new(relay: RelayClient) -> Self {
        Self {
            state: ChatState::default(),
            transcript: Vec::new(),
            relay,
            next_temp_id: 1,
        }
    }

    /// Current state record
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Message history of the active session
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    fn dispatch(&mut self, action: ChatAction) {
        self.state = reduce(&self.state, action);
    }

    /// Replace the draft input
    pub fn set_input(&mut self, text: &str) {
        self.dispatch(ChatAction::SetInput(text.to_string()));
    }

    /// Clear the inline error
    pub fn dismiss_error(&mut self) {
        self.dispatch(ChatAction::SetError(None));
    }

    /// Reload the session list from the relay
    ///
    /// Keeps the current selection when it still exists; otherwise
    /// selects the first session, or nothing when the list is empty.
    pub async fn refresh_sessions(&mut self) -> Result<()> {
        let sessions: Vec<SessionEntry> = self
            .relay
            .list_sessions()
            .await?
            .into_iter()
            .map(SessionEntry::from)
            .collect();
        self.dispatch(ChatAction::SetSessions(sessions));
        if self.state.active_entry().is_none() {
            let first = self.state.sessions.first().map(|s| s.id.clone());
            self.select(first).await?;
        }
        Ok(())
    }

    async fn select(&mut self, session: Option<SessionRef>) -> Result<()> {
        self.dispatch(ChatAction::SelectSession(session));
        self.transcript.clear();
        if let Some(id) = self
            .state
            .active
            .as_ref()
            .and_then(|s| s.confirmed_id())
            .map(str::to_string)
        {
            self.transcript = self.relay.history(&id).await?;
        }
        Ok(())
    }

    /// Select a confirmed session by id and load its history
    pub async fn select_session(&mut self, session_id: &str) -> Result<()> {
        self.select(Some(SessionRef::Confirmed(session_id.to_string())))
            .await
    }

    /// Start a new chat, optimistically
    ///
    /// A pending entry appears and becomes active immediately; it is
    /// reconciled with the server id on success. On failure the entry
    /// is removed, the selection falls back to the first remaining
    /// session (or none), and the error surfaces inline.
    pub async fn new_chat(&mut self) -> Result<()> {
        let temp = self.next_temp_id;
        self.next_temp_id += 1;

        let mut sessions = self.state.sessions.clone();
        sessions.push(SessionEntry {
            id: SessionRef::Pending(temp),
            name: DEFAULT_SESSION_NAME.to_string(),
            summary: None,
        });
        self.dispatch(ChatAction::SetSessions(sessions));
        self.dispatch(ChatAction::SelectSession(Some(SessionRef::Pending(temp))));
        self.transcript.clear();

        match self.relay.create_session(None, None).await {
            Ok(created) => {
                let confirmed = SessionRef::Confirmed(created.id.clone());
                let mut sessions = self.state.sessions.clone();
                for entry in &mut sessions {
                    if entry.id == SessionRef::Pending(temp) {
                        entry.id = confirmed.clone();
                        entry.name = created.name.clone();
                        entry.summary = created.summary.clone();
                    }
                }
                self.dispatch(ChatAction::SetSessions(sessions));
                if self.state.active == Some(SessionRef::Pending(temp)) {
                    self.dispatch(ChatAction::SelectSession(Some(confirmed)));
                }
                Ok(())
            }
            Err(e) => {
                let sessions: Vec<SessionEntry> = self
                    .state
                    .sessions
                    .iter()
                    .filter(|s| s.id != SessionRef::Pending(temp))
                    .cloned()
                    .collect();
                let fallback = sessions.first().map(|s| s.id.clone());
                self.dispatch(ChatAction::SetSessions(sessions));
                self.dispatch(ChatAction::SetError(Some(format!(
                    "could not create session: {}",
                    e
                ))));
                self.select(fallback).await
            }
        }
    }

    /// Delete a session and repair the selection
    ///
    /// When the deleted session was active, selection moves to the
    /// first remaining session, or to nothing when the list empties.
    pub async fn delete_session(&mut self, session_id: &str) -> Result<()> {
        self.relay.delete_session(session_id).await?;
        let deleted = SessionRef::Confirmed(session_id.to_string());
        let sessions: Vec<SessionEntry> = self
            .state
            .sessions
            .iter()
            .filter(|s| s.id != deleted)
            .cloned()
            .collect();
        let was_active = self.state.active == Some(deleted);
        self.dispatch(ChatAction::SetSessions(sessions));
        if was_active {
            let fallback = self.state.sessions.first().map(|s| s.id.clone());
            self.select(fallback).await?;
        }
        Ok(())
    }

    /// Send the current draft and stream the reply into `on_token`
    ///
    /// No-op when the send guard rejects. Stream failures surface as
    /// `chat_error` rather than a returned error; the typing indicator
    /// and streaming buffer are always cleared.
    pub async fn send_message(&mut self, mut on_token: impl FnMut(&str)) -> Result<()> {
        if !self.state.can_send() {
            return Ok(());
        }
        let Some(session_id) = self
            .state
            .active
            .as_ref()
            .and_then(|s| s.confirmed_id())
            .map(str::to_string)
        else {
            self.dispatch(ChatAction::SetError(Some(
                "no active session".to_string(),
            )));
            return Ok(());
        };

        let text = self.state.input.trim().to_string();
        self.dispatch(ChatAction::SetInput(String::new()));
        self.dispatch(ChatAction::SetError(None));
        self.dispatch(ChatAction::SetAiTyping(true));
        self.dispatch(ChatAction::SetStreaming(Some(String::new())));

        let mut messages = self.transcript.clone();
        messages.push(Message::user(&text));

        let relay = &self.relay;
        let state = &mut self.state;
        let mut assembled = String::new();
        let result = relay
            .stream_chat(&messages, &session_id, |token| {
                assembled.push_str(token);
                *state = reduce(state, ChatAction::SetStreaming(Some(assembled.clone())));
                on_token(token);
            })
            .await;

        self.dispatch(ChatAction::SetAiTyping(false));
        self.dispatch(ChatAction::SetStreaming(None));

        match result {
            Ok(()) => {
                self.dispatch(ChatAction::IncrementCounter);
                // The relay sends the sentinel before its persist
                // completes, so an immediate read can briefly miss the
                // new turn. Retry a few times before falling back to
                // the locally assembled transcript.
                let expected = messages.len() + 1;
                let mut refreshed = None;
                for _ in 0..5 {
                    match self.relay.history(&session_id).await {
                        Ok(history) if history.len() >= expected => {
                            refreshed = Some(history);
                            break;
                        }
                        Ok(_) => {
                            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        }
                        Err(_) => break,
                    }
                }
                match refreshed {
                    Some(history) => self.transcript = history,
                    None => {
                        messages.push(Message::assistant(&assembled));
                        self.transcript = messages;
                    }
                }
                self.maybe_generate_name(&session_id).await;
                Ok(())
            }
            Err(e) => {
                // Interrupted or failed streams are discarded; the
                // relay persisted nothing, so neither do we.
                self.dispatch(ChatAction::SetError(Some(e.to_string())));
                Ok(())
            }
        }
    }

    /// Best-effort, at-most-once name generation after a first exchange
    ///
    /// Runs only while the active entry still carries the default name,
    /// so a successful rename stops subsequent sends from asking again.
    /// Failures are logged and swallowed; naming never blocks chat.
    async fn maybe_generate_name(&mut self, session_id: &str) {
        let needs_name = self
            .state
            .active_entry()
            .map(SessionEntry::has_default_name)
            .unwrap_or(false);
        if !needs_name {
            return;
        }
        match self.relay.generate_name(session_id, &self.transcript).await {
            Ok(name) => {
                let mut sessions = self.state.sessions.clone();
                for entry in &mut sessions {
                    if entry.id.confirmed_id() == Some(session_id) {
                        entry.name = name.clone();
                    }
                }
                self.dispatch(ChatAction::SetSessions(sessions));
            }
            Err(e) => {
                tracing::debug!("session naming skipped: {}", e);
            }
        }
    }
}
