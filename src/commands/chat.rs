//! Interactive chat command
//!
//! A readline-based loop that streams mentor replies from the relay
//! token by token. Session selection, creation, and deletion are
//! available as slash commands inside the loop.

use std::io::Write;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::chat::{ChatController, RelayClient, SessionEntry, SessionRef};
use crate::config::Config;
use crate::error::Result;

/// Special commands recognized inside the chat loop
enum SpecialCommand {
    NewChat,
    ListSessions,
    Switch(String),
    Delete(String),
    Help,
    Exit,
    None,
}

fn parse_special_command(input: &str) -> SpecialCommand {
    let mut parts = input.split_whitespace();
    match parts.next() {
        Some("/new") => SpecialCommand::NewChat,
        Some("/sessions") => SpecialCommand::ListSessions,
        Some("/switch") => match parts.next() {
            Some(id) => SpecialCommand::Switch(id.to_string()),
            None => {
                eprintln!("Usage: /switch <session-id>");
                SpecialCommand::None
            }
        },
        Some("/delete") => match parts.next() {
            Some(id) => SpecialCommand::Delete(id.to_string()),
            None => {
                eprintln!("Usage: /delete <session-id>");
                SpecialCommand::None
            }
        },
        Some("/help") => SpecialCommand::Help,
        Some("exit") | Some("quit") | Some("/quit") => SpecialCommand::Exit,
        _ => SpecialCommand::None,
    }
}

fn print_welcome_banner(user_id: &str, relay_url: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              Uplevel Mentor Chat - Welcome!                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("User:  {}", user_id.bold());
    println!("Relay: {}\n", relay_url);
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

fn print_help() {
    println!("\nAvailable commands:");
    println!("  /new                 Start a new chat session");
    println!("  /sessions            List your sessions");
    println!("  /switch <id>         Switch to another session");
    println!("  /delete <id>         Delete a session");
    println!("  /help                Show this help");
    println!("  exit                 Leave chat\n");
}

fn print_session_list(sessions: &[SessionEntry], active: Option<&SessionRef>) {
    if sessions.is_empty() {
        println!("No sessions yet; '/new' starts one\n");
        return;
    }
    println!();
    for entry in sessions {
        let marker = if Some(&entry.id) == active { "*" } else { " " };
        match &entry.id {
            SessionRef::Confirmed(id) => {
                println!("{} {}  {}", marker.green().bold(), id.dimmed(), entry.name)
            }
            SessionRef::Pending(_) => {
                println!("{} {}  {}", marker.green().bold(), "(pending)".dimmed(), entry.name)
            }
        }
    }
    println!();
}

/// Run the interactive chat loop against the configured relay
pub async fn handle_chat_command(config: &Config, session: Option<&str>) -> Result<()> {
    tracing::info!("Starting interactive chat");

    let relay = RelayClient::new(&config.chat.relay_url, &config.chat.user_id)?;
    let mut controller = ChatController::new(relay);

    controller.refresh_sessions().await?;
    match session {
        Some(id) => controller.select_session(id).await?,
        None => {
            if controller.state().sessions.is_empty() {
                controller.new_chat().await?;
            }
        }
    }

    print_welcome_banner(&config.chat.user_id, &config.chat.relay_url);
    print_session_list(
        &controller.state().sessions,
        controller.state().active.as_ref(),
    );

    let mut rl = DefaultEditor::new()?;

    loop {
        let name = controller
            .state()
            .active_entry()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "no session".to_string());
        let prompt = format!("{} > ", name.cyan());

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_special_command(trimmed) {
                    SpecialCommand::NewChat => {
                        controller.new_chat().await?;
                        if let Some(err) = &controller.state().chat_error {
                            eprintln!("{} {}\n", "Error:".red(), err);
                            controller.dismiss_error();
                        }
                        continue;
                    }
                    SpecialCommand::ListSessions => {
                        controller.refresh_sessions().await?;
                        print_session_list(
                            &controller.state().sessions,
                            controller.state().active.as_ref(),
                        );
                        continue;
                    }
                    SpecialCommand::Switch(id) => {
                        match controller.select_session(&id).await {
                            Ok(()) => println!("Switched to {}\n", id.dimmed()),
                            Err(e) => eprintln!("{} {}\n", "Error:".red(), e),
                        }
                        continue;
                    }
                    SpecialCommand::Delete(id) => {
                        match controller.delete_session(&id).await {
                            Ok(()) => println!("Deleted {}\n", id.dimmed()),
                            Err(e) => eprintln!("{} {}\n", "Error:".red(), e),
                        }
                        continue;
                    }
                    SpecialCommand::Help => {
                        print_help();
                        continue;
                    }
                    SpecialCommand::Exit => break,
                    SpecialCommand::None => {}
                }

                rl.add_history_entry(trimmed)?;
                controller.set_input(trimmed);

                println!();
                controller
                    .send_message(|token| {
                        print!("{}", token);
                        let _ = std::io::stdout().flush();
                    })
                    .await?;
                println!("\n");

                if let Some(err) = &controller.state().chat_error {
                    eprintln!("{} {}\n", "Error:".red(), err);
                    controller.dismiss_error();
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
