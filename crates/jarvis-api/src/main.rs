//! Jarvis CLI, chat client and REST API entry point.
//!
//! Binary name: `jarvis`
//!
//! `jarvis serve` starts the backend; `jarvis chat` opens the terminal
//! client against a running backend.

mod cli;
mod http;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use jarvis_core::chat::store::spawn_idle_sweeper;
use jarvis_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before clap, so `.env` can supply JARVIS_* flag defaults.
    let dotenv_path = jarvis_infra::config::load_dotenv();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "jarvis", &mut std::io::stdout());
        return Ok(());
    }

    let is_chat = matches!(cli.command, Commands::Chat { .. });
    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    tracing_options.format = cli.log_format.into();
    tracing_options.enable_otel = cli.otel;
    if is_chat {
        // The terminal client owns stdout; keep logs quiet unless asked.
        tracing_options.stderr = true;
        if cli.verbose == 0 && !cli.quiet {
            tracing_options.default_filter = "warn".to_string();
        }
    }
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let result = match cli.command {
        Commands::Serve { host, port } => serve(&host, port).await,
        Commands::Chat { url, timeout } => {
            cli::chat::loop_runner::run_chat_loop(&url, timeout).await
        }
        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}

/// Run the HTTP backend until Ctrl+C or SIGTERM.
async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::init().await;

    let shutdown = CancellationToken::new();
    let sweeper = spawn_idle_sweeper(Arc::clone(&state.store), shutdown.clone());

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        data_dir = %state.data_dir.display(),
        provider_ready = state.router.is_available(),
        model = state.router.model().unwrap_or("-"),
        idle_ttl_secs = state.config.sessions.idle_ttl_secs,
        max_sessions = state.config.sessions.max_sessions,
        "backend listening"
    );

    println!(
        "  {} J.A.R.V.I.S. API listening on {}",
        console::style("$").green().bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    if !state.router.is_available() {
        println!(
            "  {} No usable GEMINI_API_KEY: chat requests will get 503 until it is configured.",
            console::style("!").yellow().bold()
        );
    }
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
