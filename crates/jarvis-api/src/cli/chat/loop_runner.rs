//! Main chat loop orchestration.
//!
//! One random user identifier per run keeps the whole run inside a single
//! backend conversation. The loop is strictly sequential: no new input is
//! read while a reply is pending.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use jarvis_types::chat::TranscriptEntry;

use super::banner::print_welcome_banner;
use super::client::{ChatClient, render_error};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

pub const WELCOME_MESSAGE: &str = "Hello! My name is J.A.R.V.I.S. and I will be your financial assistant. \
How can I help you with your finances?";

/// Exchange one message with the backend and return the assistant line.
///
/// Never fails: errors become their rendered text, so every user turn is
/// followed by an assistant turn.
pub async fn exchange(client: &ChatClient, user_id: &str, message: &str) -> TranscriptEntry {
    match client.send(user_id, message).await {
        Ok(reply) => TranscriptEntry::assistant(reply),
        Err(e) => {
            tracing::debug!(error = %e, "chat request failed");
            TranscriptEntry::assistant(render_error(&e))
        }
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Analyzing your question...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop against `api_url`.
pub async fn run_chat_loop(api_url: &str, timeout_secs: u64) -> anyhow::Result<()> {
    let client = ChatClient::new(api_url, Duration::from_secs(timeout_secs))?;
    let user_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(user_id = %user_id, api_url, "chat client started");

    print_welcome_banner(client.url(), &user_id);

    let renderer = ChatRenderer::new();
    let mut transcript = vec![TranscriptEntry::assistant(WELCOME_MESSAGE)];
    renderer.print_entry(&transcript[0]);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => commands::print_help(),
                        ChatCommand::History => renderer.print_transcript(&transcript),
                        ChatCommand::Clear => chat_input.clear(),
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                        ChatCommand::Unknown(name) => println!(
                            "\n  {} Unknown command: {}. Type /help for available commands.\n",
                            style("?").yellow().bold(),
                            style(name).dim()
                        ),
                    }
                    continue;
                }

                chat_input.remember(&text);
                transcript.push(TranscriptEntry::user(text.clone()));

                let spinner = thinking_spinner();
                let reply = exchange(&client, &user_id, &text).await;
                spinner.finish_and_clear();

                renderer.print_entry(&reply);
                transcript.push(reply);
            }
        }
    }

    tracing::debug!(turns = transcript.len(), "chat client finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_types::chat::TranscriptRole;

    #[tokio::test]
    async fn test_exchange_failure_still_yields_assistant_turn() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ChatClient::new(format!("http://{addr}/chat"), Duration::from_secs(2)).unwrap();
        let entry = exchange(&client, "u1", "hello").await;

        assert_eq!(entry.role, TranscriptRole::Assistant);
        assert!(entry.content.starts_with("Connection error"));
    }

    #[test]
    fn test_welcome_message_mentions_finances() {
        assert!(WELCOME_MESSAGE.contains("J.A.R.V.I.S."));
        assert!(WELCOME_MESSAGE.contains("finances"));
    }
}
