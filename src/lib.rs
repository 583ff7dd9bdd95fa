//! Uplevel - AI mentor chat relay and terminal client
//!
//! This library implements a streaming chat subsystem: a relay server
//! that bridges clients to an OpenAI-compatible completion provider
//! over server-sent events, a SQLite-backed session store, and a
//! terminal chat client built on a pure state reducer.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `relay`: Axum server exposing the session and streaming endpoints
//! - `session`: Session persistence (SQLite, whole-history documents)
//! - `providers`: Completion provider abstraction and OpenAI implementation
//! - `chat`: Terminal client state machine and relay HTTP client
//! - `prompts`: Mentor system prompt and session naming prompt
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use uplevel::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     // Server or client startup would go here
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod relay;
pub mod session;

// Re-export commonly used types
pub use chat::{ChatAction, ChatController, ChatState, RelayClient, SessionRef};
pub use config::Config;
pub use error::{Result, UplevelError};
pub use providers::{Message, Provider, Role};
pub use relay::AppState;
pub use session::{SessionStore, SessionSummary};
