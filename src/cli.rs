//! Command-line interface definition for Uplevel
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the relay server, the interactive chat
//! client, and session management.

use clap::{Parser, Subcommand};

/// Uplevel - AI mentor chat relay and terminal client
///
/// Run the streaming relay server, chat with the mentor from a
/// terminal, or manage stored chat sessions.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "uplevel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the sessions database path
    #[arg(long, env = "UPLEVEL_SESSIONS_DB")]
    pub sessions_db: Option<String>,

    /// Override the relay URL the chat client talks to
    #[arg(long)]
    pub relay_url: Option<String>,

    /// Override the user identity sent to the relay
    #[arg(long)]
    pub user: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for Uplevel
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the streaming relay server
    Serve {
        /// Override the bind address from config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Start interactive chat with the AI mentor
    Chat {
        /// Resume an existing session by id
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Manage stored chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List stored sessions
    List,

    /// Rename a session
    Rename {
        /// Session id
        id: String,

        /// New display name
        name: String,
    },

    /// Delete a session (no error if already absent)
    Delete {
        /// Session id
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
