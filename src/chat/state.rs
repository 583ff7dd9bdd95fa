//! Client chat state machine
//!
//! A single-threaded reducer: every UI-relevant transition is a pure
//! function over an immutable state record, driven by actions that
//! asynchronous I/O callbacks dispatch. There is no shared mutable
//! state; the owner holds the record and replaces it on each dispatch.

use crate::session::{SessionSummary, DEFAULT_SESSION_NAME};

/// Reference to a session, confirmed by the server or optimistically
/// pending
///
/// New-chat creation inserts a `Pending` entry immediately so the UI
/// never blocks on the creation round trip; the entry is swapped for
/// `Confirmed` on success or removed on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    /// Server-confirmed session id
    Confirmed(String),
    /// Locally fabricated temporary id awaiting confirmation
    Pending(u64),
}

impl SessionRef {
    /// The confirmed id, if this reference has one
    pub fn confirmed_id(&self) -> Option<&str> {
        match self {
            Self::Confirmed(id) => Some(id),
            Self::Pending(_) => None,
        }
    }
}

/// One entry in the client's session list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Session reference (confirmed or pending)
    pub id: SessionRef,
    /// Display name
    pub name: String,
    /// Optional summary line
    pub summary: Option<String>,
}

impl SessionEntry {
    /// Whether the entry still carries the default display name
    pub fn has_default_name(&self) -> bool {
        self.name == DEFAULT_SESSION_NAME
    }
}

impl From<SessionSummary> for SessionEntry {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: SessionRef::Confirmed(summary.id),
            name: summary.name,
            summary: summary.summary,
        }
    }
}

/// Full client chat state record
///
/// `streaming_message` is the transient buffer for the in-flight
/// assistant response; it exists only between send and stream
/// completion (or error) and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    /// Known sessions, in list order
    pub sessions: Vec<SessionEntry>,
    /// Currently selected session
    pub active: Option<SessionRef>,
    /// Draft input text
    pub input: String,
    /// True while a send is in flight
    pub is_ai_typing: bool,
    /// Dismissable inline error, if any
    pub chat_error: Option<String>,
    /// Accumulating buffer for the in-flight assistant reply
    pub streaming_message: Option<String>,
    /// Whether the session sidebar is visible
    pub sidebar_open: bool,
    /// Number of completed sends in this session of the UI
    pub send_count: u64,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            input: String::new(),
            is_ai_typing: false,
            chat_error: None,
            streaming_message: None,
            sidebar_open: true,
            send_count: 0,
        }
    }
}

impl ChatState {
    /// Send guard: non-empty input and no send already in flight
    ///
    /// This guard is also what serializes sends per session; a second
    /// send cannot start while the first stream is open.
    pub fn can_send(&self) -> bool {
        !self.input.trim().is_empty() && !self.is_ai_typing
    }

    /// The entry for the active session, if any
    pub fn active_entry(&self) -> Option<&SessionEntry> {
        let active = self.active.as_ref()?;
        self.sessions.iter().find(|s| &s.id == active)
    }
}

/// Action vocabulary of the chat reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Replace the session list
    SetSessions(Vec<SessionEntry>),
    /// Change the selected session
    SelectSession(Option<SessionRef>),
    /// Replace the draft input
    SetInput(String),
    /// Toggle the typing indicator
    SetAiTyping(bool),
    /// Set or clear the inline error
    SetError(Option<String>),
    /// Replace the streaming buffer (None once finalized or failed)
    SetStreaming(Option<String>),
    /// Show or hide the sidebar
    ToggleSidebar,
    /// Count a completed send
    IncrementCounter,
}

/// Pure state transition
///
/// Returns the next state; the input state is never mutated.
pub fn reduce(state: &ChatState, action: ChatAction) -> ChatState {
    let mut next = state.clone();
    match action {
        ChatAction::SetSessions(sessions) => next.sessions = sessions,
        ChatAction::SelectSession(session) => next.active = session,
        ChatAction::SetInput(input) => next.input = input,
        ChatAction::SetAiTyping(typing) => next.is_ai_typing = typing,
        ChatAction::SetError(error) => next.chat_error = error,
        ChatAction::SetStreaming(buffer) => next.streaming_message = buffer,
        ChatAction::ToggleSidebar => next.sidebar_open = !next.sidebar_open,
        ChatAction::IncrementCounter => next.send_count += 1,
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> SessionEntry {
        SessionEntry {
            id: SessionRef::Confirmed(id.to_string()),
            name: name.to_string(),
            summary: None,
        }
    }

    #[test]
    fn test_reduce_does_not_mutate_input_state() {
        let state = ChatState::default();
        let _next = reduce(&state, ChatAction::SetInput("draft".into()));
        assert_eq!(state.input, "");
    }

    #[test]
    fn test_set_sessions_replaces_list() {
        let state = ChatState::default();
        let next = reduce(
            &state,
            ChatAction::SetSessions(vec![entry("a", "first"), entry("b", "second")]),
        );
        assert_eq!(next.sessions.len(), 2);
        assert_eq!(next.sessions[0].name, "first");
    }

    #[test]
    fn test_select_session() {
        let state = ChatState::default();
        let next = reduce(
            &state,
            ChatAction::SelectSession(Some(SessionRef::Confirmed("a".into()))),
        );
        assert_eq!(next.active, Some(SessionRef::Confirmed("a".into())));

        let cleared = reduce(&next, ChatAction::SelectSession(None));
        assert!(cleared.active.is_none());
    }

    #[test]
    fn test_toggle_sidebar_flips() {
        let state = ChatState::default();
        assert!(state.sidebar_open);
        let next = reduce(&state, ChatAction::ToggleSidebar);
        assert!(!next.sidebar_open);
        let again = reduce(&next, ChatAction::ToggleSidebar);
        assert!(again.sidebar_open);
    }

    #[test]
    fn test_increment_counter() {
        let state = ChatState::default();
        let next = reduce(&state, ChatAction::IncrementCounter);
        assert_eq!(next.send_count, 1);
    }

    #[test]
    fn test_can_send_guard() {
        let mut state = ChatState::default();
        assert!(!state.can_send(), "empty input must not send");

        state.input = "   ".into();
        assert!(!state.can_send(), "whitespace input must not send");

        state.input = "hello".into();
        assert!(state.can_send());

        state.is_ai_typing = true;
        assert!(!state.can_send(), "sends are serialized while typing");
    }

    #[test]
    fn test_streaming_buffer_concatenation() {
        // For fragments F1..Fn, the assembled buffer after n dispatches
        // equals F1+...+Fn regardless of fragment boundaries.
        let fragments = ["Del", "egation", " starts", " with", " trust."];
        let mut state = ChatState::default();
        let mut buffer = String::new();
        let mut seen = Vec::new();

        state = reduce(&state, ChatAction::SetStreaming(Some(String::new())));
        for fragment in fragments {
            buffer.push_str(fragment);
            state = reduce(&state, ChatAction::SetStreaming(Some(buffer.clone())));
            seen.push(state.streaming_message.clone().unwrap());
        }

        assert_eq!(
            seen,
            vec![
                "Del",
                "Delegation",
                "Delegation starts",
                "Delegation starts with",
                "Delegation starts with trust."
            ]
        );

        let finalized = reduce(&state, ChatAction::SetStreaming(None));
        assert!(finalized.streaming_message.is_none());
    }

    #[test]
    fn test_active_entry_lookup() {
        let mut state = ChatState::default();
        state.sessions = vec![entry("a", "first"), entry("b", "second")];
        state.active = Some(SessionRef::Confirmed("b".into()));
        assert_eq!(state.active_entry().unwrap().name, "second");

        state.active = Some(SessionRef::Confirmed("zz".into()));
        assert!(state.active_entry().is_none());
    }

    #[test]
    fn test_session_ref_confirmed_id() {
        assert_eq!(
            SessionRef::Confirmed("abc".into()).confirmed_id(),
            Some("abc")
        );
        assert_eq!(SessionRef::Pending(3).confirmed_id(), None);
    }

    #[test]
    fn test_entry_from_summary() {
        let summary = SessionSummary {
            id: "s1".into(),
            name: DEFAULT_SESSION_NAME.into(),
            summary: Some("intro".into()),
        };
        let entry = SessionEntry::from(summary);
        assert_eq!(entry.id, SessionRef::Confirmed("s1".into()));
        assert!(entry.has_default_name());
        assert_eq!(entry.summary.as_deref(), Some("intro"));
    }
}
