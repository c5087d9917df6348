//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` to provide async line reading with
//! handling of EOF (Ctrl+D) and interrupt (Ctrl+C).

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a line (trimmed).
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create a new chat input handler with the given prompt.
    ///
    /// Also returns a `SharedWriter` for printing without clobbering the
    /// prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    /// Read a line of input. Read errors end the session like Ctrl+D.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(event) => input_event(event),
            Err(e) => {
                tracing::debug!(error = %e, "readline failed; ending session");
                InputEvent::Eof
            }
        }
    }

    /// Record a submitted line so it can be recalled with the arrow keys.
    pub fn remember(&mut self, line: &str) {
        self.rl.add_history_entry(line.to_string());
    }

    /// Clear the terminal screen.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}

fn input_event(event: ReadlineEvent) -> InputEvent {
    match event {
        ReadlineEvent::Line(line) => InputEvent::Message(line.trim().to_string()),
        ReadlineEvent::Eof => InputEvent::Eof,
        ReadlineEvent::Interrupted => InputEvent::Interrupted,
    }
}
