//! Command implementations for the CLI

pub mod chat;
pub mod serve;
pub mod sessions;

pub use chat::handle_chat_command;
pub use serve::handle_serve_command;
pub use sessions::handle_session_command;
