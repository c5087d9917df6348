//! Terminal markdown rendering for transcript lines.
//!
//! Assistant replies are markdown; `termimad` renders them for the terminal.
//! User lines are printed as typed.

use console::style;
use termimad::MadSkin;
use termimad::crossterm::style::Color;

use jarvis_types::chat::{TranscriptEntry, TranscriptRole};

pub const ASSISTANT_LABEL: &str = "J.A.R.V.I.S.";

pub struct ChatRenderer {
    skin: MadSkin,
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(Color::Cyan);
        skin.headers[0].set_fg(Color::Cyan);
        skin.headers[1].set_fg(Color::Cyan);
        skin.inline_code.set_fg(Color::Yellow);
        Self { skin }
    }

    /// Render markdown to an ANSI-styled string sized to the terminal.
    pub fn render(&self, markdown: &str) -> String {
        self.skin.term_text(markdown).to_string()
    }

    /// Print one transcript line.
    pub fn print_entry(&self, entry: &TranscriptEntry) {
        match entry.role {
            TranscriptRole::User => {
                println!("  {} {}", style("You >").green().bold(), entry.content);
            }
            TranscriptRole::Assistant => {
                println!();
                println!("  {}", style(ASSISTANT_LABEL).cyan().bold());
                for line in self.render(&entry.content).lines() {
                    println!("  {line}");
                }
                println!();
            }
        }
    }

    /// Re-print the whole transcript.
    pub fn print_transcript(&self, transcript: &[TranscriptEntry]) {
        println!();
        println!("  {}", style("--- conversation so far ---").dim());
        for entry in transcript {
            self.print_entry(entry);
        }
        println!("  {}", style("---").dim());
        println!();
    }
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}
