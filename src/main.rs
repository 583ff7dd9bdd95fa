//! Uplevel - AI mentor chat relay and terminal client
//!
//! Main entry point for the Uplevel application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use uplevel::cli::{Cli, Commands};
use uplevel::commands;
use uplevel::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // If the user supplied a database path on the CLI (or via env),
    // mirror it into UPLEVEL_SESSIONS_DB so the store initializer can
    // pick it up without threading the path through every caller.
    if let Some(db_path) = &cli.sessions_db {
        std::env::set_var("UPLEVEL_SESSIONS_DB", db_path);
        tracing::info!("Using sessions DB override from CLI: {}", db_path);
    }

    // Load and validate configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Some(Commands::Serve { bind }) => {
            tracing::info!("Starting relay server");
            commands::handle_serve_command(&config, bind.as_deref()).await?;
        }
        Some(Commands::Chat { session }) => {
            commands::handle_chat_command(&config, session.as_deref()).await?;
        }
        Some(Commands::Sessions { command }) => {
            commands::handle_session_command(&config, command)?;
        }
        None => {
            // Default to interactive chat
            commands::handle_chat_command(&config, None).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "uplevel=debug" } else { "uplevel=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
