//! Completion gateway for Uplevel
//!
//! This module contains the message types shared across the whole
//! system, the provider abstraction wrapping third-party completion
//! APIs, and the OpenAI-compatible implementation.

pub mod openai;

pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, UplevelError};

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Role of a chat message sender
///
/// The system only persists `user` and `assistant` turns; system
/// prompts are injected by the gateway and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message typed by the user
    User,
    /// A message produced by the completion provider
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message
///
/// Messages are immutable once appended to a session transcript. The
/// content is opaque to the system (it may contain the provider's
/// markdown dialect). Timestamps are RFC-3339 strings.
///
/// # Examples
///
/// ```
/// use uplevel::providers::{Message, Role};
///
/// let msg = Message::user("How do I delegate effectively?");
/// assert_eq!(msg.role, Role::User);
/// assert!(!msg.timestamp.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Message text
    pub content: String,
    /// Creation time, RFC-3339
    pub timestamp: String,
}

impl Message {
    /// Creates a new user message stamped with the current time
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a new assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A finite, ordered stream of response fragments
///
/// Each item is a substring to append, not a complete message; the
/// consumer must concatenate fragments in arrival order. The stream is
/// not restartable: a transport failure yields one `Err` item and then
/// the stream ends.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Abstraction over a third-party completion API
///
/// The gateway performs no retries; retry policy is the caller's
/// responsibility (in this system: surface an error, let the user
/// resend).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Single blocking completion call
    ///
    /// # Arguments
    ///
    /// * `messages` - Ordered conversation history
    /// * `system_prompt` - Optional system prompt prepended to the request
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::Provider` on any transport or API failure.
    async fn complete(&self, messages: &[Message], system_prompt: Option<&str>) -> Result<String>;

    /// Incremental token-stream completion
    ///
    /// Returns a lazy sequence of text fragments that terminates when
    /// the provider signals completion.
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::Provider` if the request is rejected
    /// before streaming begins. Mid-stream failures surface as an `Err`
    /// item inside the returned stream.
    async fn stream_complete(
        &self,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<TokenStream>;
}

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration section
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config.openai.clone())?)),
        other => {
            Err(UplevelError::Provider(format!("Unknown provider type: {}", other)).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_message_constructors() {
        let user = Message::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");

        let assistant = Message::assistant("hi there");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, "hi there");
    }

    #[test]
    fn test_message_timestamp_is_rfc3339() {
        let msg = Message::user("hello");
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
    }

    #[test]
    fn test_message_json_round_trip() {
        let msg = Message::assistant("Delegation starts with trust.");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_create_provider_openai() {
        let config = ProviderConfig {
            provider_type: "openai".to_string(),
            openai: OpenAiConfig::default(),
        };
        assert!(create_provider(&config).is_ok());
    }

    #[test]
    fn test_create_provider_unknown_type() {
        let config = ProviderConfig {
            provider_type: "mystery".to_string(),
            openai: OpenAiConfig::default(),
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider type"));
    }
}
