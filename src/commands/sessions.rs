//! Session management commands
//!
//! Operates on the local session database directly; no relay needs to
//! be running.

use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;

/// Handle `sessions` subcommands
pub fn handle_session_command(config: &Config, command: SessionCommand) -> Result<()> {
    let store = SessionStore::new()?;
    let user_id = &config.chat.user_id;

    match command {
        SessionCommand::List => {
            let sessions = store.list_sessions(user_id)?;

            if sessions.is_empty() {
                println!("{}", "No sessions found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Name".bold(),
                "Summary".bold()
            ]);

            for session in sessions {
                let summary = session.summary.unwrap_or_else(|| "-".to_string());
                table.add_row(prettytable::row![
                    session.id.cyan(),
                    session.name,
                    truncate_summary(&summary)
                ]);
            }

            println!("\nChat Sessions ({}):", user_id);
            table.printstd();
            println!();
            println!(
                "Use {} to open a session.",
                "uplevel chat --session <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Rename { id, name } => {
            store.rename(user_id, &id, &name)?;
            println!("{}", format!("Renamed session {} to '{}'", id, name).green());
        }
        SessionCommand::Delete { id } => {
            store.delete_session(user_id, &id)?;
            println!("{}", format!("Deleted session {}", id).green());
        }
    }

    Ok(())
}

/// Truncate a summary for table display, counting chars so multibyte
/// text never splits mid-character
fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() > 50 {
        let head: String = summary.chars().take(47).collect();
        format!("{}...", head)
    } else {
        summary.to_string()
    }
}
