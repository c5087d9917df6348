//! CLI command definitions for the `jarvis` binary.
//!
//! Uses clap derive macros for argument parsing. `jarvis serve` runs the
//! backend, `jarvis chat` opens the interactive terminal client against it.

pub mod chat;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use jarvis_observe::LogFormat;

/// Default backend endpoint used by the chat client.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/chat";

/// J.A.R.V.I.S., a conversational financial assistant.
#[derive(Parser)]
#[command(name = "jarvis", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all log output except errors.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    pub log_format: LogFormatArg,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat backend (HTTP API).
    Serve {
        /// Address to bind.
        #[arg(long, env = "JARVIS_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(long, short, env = "JARVIS_PORT", default_value_t = 8000)]
        port: u16,
    },

    /// Chat with the assistant from the terminal.
    Chat {
        /// Full URL of the backend chat endpoint.
        #[arg(long, env = "JARVIS_API_URL", default_value = DEFAULT_API_URL)]
        url: String,

        /// Seconds to wait for each reply.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
