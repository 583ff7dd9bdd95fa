//! Serve command: run the relay server

use std::sync::Arc;

use colored::Colorize;

use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_provider, Provider};
use crate::relay::{self, AppState};
use crate::session::SessionStore;

/// Start the relay server and block until it exits
pub async fn handle_serve_command(config: &Config, bind: Option<&str>) -> Result<()> {
    let store = SessionStore::new()?;
    let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.provider)?);
    let state = AppState::new(Arc::new(store), provider);

    let bind = bind.unwrap_or(&config.server.bind);
    println!("{} {}", "Relay listening on".green(), bind.bold());

    relay::serve(bind, state).await
}
