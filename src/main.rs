//! # Veritas CLI (`veritas`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `veritas serve` | Start the HTTP service |
//! | `veritas verify "<query>"` | Look up evidence once and print it |
//! | `veritas ask "<text>"` | Run one fact-check turn and print the answer |
//!
//! ## Examples
//!
//! ```bash
//! # Start the service on the configured bind address
//! veritas serve --config ./config/veritas.toml
//!
//! # Run as a front end for a separate /verify service
//! SEARCH_API_URL=https://verify.internal veritas serve
//!
//! # One-off evidence lookup
//! veritas verify "great wall of china visible from space"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use veritas::{config, orchestrator, search, server};

const DEFAULT_CONFIG: &str = "./config/veritas.toml";

/// Veritas — a multilingual fact-checking agent backed by web search and
/// a generative model.
///
/// Credentials are read from `GOOGLE_SEARCH_API_KEY`, `GOOGLE_CSE_ID`, and
/// `GEMINI_API_KEY`. There are no built-in defaults for them.
#[derive(Parser)]
#[command(
    name = "veritas",
    about = "Veritas — a multilingual fact-checking agent backed by web search and an LLM",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/veritas.toml`; when that default file is
    /// absent, built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service.
    ///
    /// Serves `GET /verify`, `POST /analyze-with-agent`, and `GET /health`
    /// on `[server].bind` (or `PORT`).
    Serve,

    /// Look up evidence for a query and print it.
    Verify {
        /// The search query.
        query: String,
    },

    /// Run one fact-check turn and print the agent's answer.
    Ask {
        /// The message to check or respond to, in any language.
        text: String,

        /// Session id to attach the turn to.
        #[arg(long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (path, required) = match cli.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    let mut cfg = config::load_config(&path, required)?;
    cfg.apply_env_overrides(|key| std::env::var(key).ok())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Verify { query } => {
            search::run_verify(&cfg, &query).await?;
        }
        Commands::Ask { text, session } => {
            orchestrator::run_ask(&cfg, &text, session).await?;
        }
    }

    Ok(())
}
