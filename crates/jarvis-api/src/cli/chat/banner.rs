//! Welcome banner display for chat sessions.

use console::style;

/// Print the banner at the start of a chat session.
///
/// Only the first 8 characters of the session identifier are shown.
pub fn print_welcome_banner(api_url: &str, session_id: &str) {
    println!();
    println!(
        "  {} {}",
        style("$").green().bold(),
        style("J.A.R.V.I.S. - financial assistant").cyan().bold()
    );
    println!();
    println!(
        "  {}  {}...",
        style("Session:").bold(),
        style(short_id(session_id)).dim()
    );
    println!("  {}  {}", style("Backend:").bold(), style(api_url).dim());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}
