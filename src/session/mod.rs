//! Session store for Uplevel
//!
//! Persists named chat sessions per user in SQLite. Each session row
//! holds its ordered transcript as one JSON array column; callers
//! replace the whole list on write, so the caller is the source of
//! truth for message ordering.

use crate::error::{Result, UplevelError};
use crate::providers::Message;
use anyhow::Context;
use directories::ProjectDirs;
use rand::distr::Alphanumeric;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

pub mod types;
pub use types::{SessionSummary, DEFAULT_SESSION_NAME};

/// Length of generated session identifiers.
const SESSION_ID_LEN: usize = 12;

/// SQLite-backed store for chat sessions
///
/// Connections are opened per call; each write is scoped to a single
/// (user, session) pair and relies on SQLite's single-row atomicity.
pub struct SessionStore {
    db_path: PathBuf,
}

impl SessionStore {
    /// Create a new store in the user's data directory
    ///
    /// The `UPLEVEL_SESSIONS_DB` environment variable overrides the
    /// database path, which makes it easy to point the binary at a test
    /// DB without touching the application data dir.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("UPLEVEL_SESSIONS_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "xbcsmith", "uplevel")
            .ok_or_else(|| UplevelError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        let db_path = data_dir.join("sessions.db");
        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Create a store backed by the given database path
    ///
    /// Primarily useful for tests that keep the DB in a temporary
    /// directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplevel::session::SessionStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SessionStore::new_with_path(dir.path().join("sessions.db")).unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| UplevelError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                summary TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                messages JSON NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| UplevelError::Storage(e.to_string()))?;

        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| UplevelError::Storage(e.to_string()).into())
    }

    fn require_user(user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(UplevelError::NotAuthenticated.into());
        }
        Ok(())
    }

    /// Create a new session with an empty transcript
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owning user
    /// * `name` - Display name (callers pass the default for "new chat")
    /// * `summary` - Optional summary line
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::NotAuthenticated` for an empty user
    /// context, `UplevelError::Storage` on database failures.
    pub fn create_session(
        &self,
        user_id: &str,
        name: &str,
        summary: Option<&str>,
    ) -> Result<SessionSummary> {
        Self::require_user(user_id)?;

        let id = generate_session_id();
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO chat_sessions (id, user_id, name, summary, created_at, updated_at, messages)
             VALUES (?, ?, ?, ?, ?, ?, '[]')",
            params![id, user_id, name, summary, now, now],
        )
        .context("Failed to insert session")
        .map_err(|e| UplevelError::Storage(e.to_string()))?;

        tracing::debug!("Created session {} for user {}", id, user_id);

        Ok(SessionSummary {
            id,
            name: name.to_string(),
            summary: summary.map(|s| s.to_string()),
        })
    }

    /// List a user's sessions as summaries, in insertion order
    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        Self::require_user(user_id)?;

        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, summary FROM chat_sessions
                 WHERE user_id = ? ORDER BY rowid ASC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(SessionSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    summary: row.get(2)?,
                })
            })
            .context("Failed to query sessions")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        let mut sessions = Vec::new();
        for s in rows.flatten() {
            sessions.push(s);
        }
        Ok(sessions)
    }

    /// Fetch a session's ordered transcript
    ///
    /// Returns an empty vec (not an error) when the session exists but
    /// has no messages yet.
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::NotFound` if the session does not exist
    /// or does not belong to `user_id`.
    pub fn get_history(&self, user_id: &str, session_id: &str) -> Result<Vec<Message>> {
        Self::require_user(user_id)?;

        let conn = self.open()?;
        let messages_json: Option<String> = conn
            .query_row(
                "SELECT messages FROM chat_sessions WHERE id = ? AND user_id = ?",
                params![session_id, user_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        let messages_json = messages_json
            .ok_or_else(|| UplevelError::NotFound(session_id.to_string()))?;

        let messages: Vec<Message> = serde_json::from_str(&messages_json)
            .context("Failed to deserialize messages")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        Ok(messages)
    }

    /// Replace a session's stored transcript with the full list given
    ///
    /// The caller sends the complete ordered transcript including the
    /// new turn, not a delta; this avoids server-side merge logic.
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::NotFound` if the session does not exist
    /// or does not belong to `user_id`.
    pub fn append_exchange(
        &self,
        user_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<()> {
        Self::require_user(user_id)?;

        let messages_json = serde_json::to_string(messages)
            .context("Failed to serialize messages")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();

        let conn = self.open()?;
        let changed = conn
            .execute(
                "UPDATE chat_sessions SET messages = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
                params![messages_json, now, session_id, user_id],
            )
            .context("Failed to update session")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        if changed == 0 {
            return Err(UplevelError::NotFound(session_id.to_string()).into());
        }

        tracing::debug!(
            "Stored {} messages in session {} for user {}",
            messages.len(),
            session_id,
            user_id
        );
        Ok(())
    }

    /// Rename a session
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::NotFound` if the session does not exist
    /// or does not belong to `user_id`.
    pub fn rename(&self, user_id: &str, session_id: &str, new_name: &str) -> Result<()> {
        Self::require_user(user_id)?;

        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.open()?;
        let changed = conn
            .execute(
                "UPDATE chat_sessions SET name = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
                params![new_name, now, session_id, user_id],
            )
            .context("Failed to rename session")
            .map_err(|e| UplevelError::Storage(e.to_string()))?;

        if changed == 0 {
            return Err(UplevelError::NotFound(session_id.to_string()).into());
        }
        Ok(())
    }

    /// Delete a session; silently a no-op if already absent
    ///
    /// Deletion is irreversible; there is no tombstoning.
    pub fn delete_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        Self::require_user(user_id)?;

        let conn = self.open()?;
        conn.execute(
            "DELETE FROM chat_sessions WHERE id = ? AND user_id = ?",
            params![session_id, user_id],
        )
        .context("Failed to delete session")
        .map_err(|e| UplevelError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// Generate an opaque short session identifier
fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}
