//! # Support Drafter CLI (`drafter`)
//!
//! ## Usage
//!
//! ```bash
//! drafter --config ./config/drafter.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `drafter run` | Draft replies for new requests once, then exit |
//! | `drafter run --dry-run` | Report what would be drafted without writing |
//! | `drafter inspect <page-id>` | Show the extracted request for one page |
//! | `drafter serve` | Start the HTTP trigger (`GET /api/process`) |
//! | `drafter watch` | Run on a fixed interval until Ctrl-C |
//!
//! Credentials are read from the environment variables named in the config
//! (`NOTION_TOKEN` and `OPENAI_API_KEY` by default).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use support_drafter::config::{self, Credentials};
use support_drafter::pipeline::Drafter;
use support_drafter::{run_cmd, server, watch};

/// Support Drafter: drafts AI replies for support requests in Notion.
#[derive(Parser)]
#[command(
    name = "drafter",
    about = "Support Drafter: drafts AI replies for support requests stored in Notion",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/drafter.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process new requests once and print a run log.
    ///
    /// Pages that already carry an AI draft callout, or that have no
    /// paragraph text yet, are skipped.
    Run {
        /// List what would be drafted without calling the model or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the title, answered flag, and question extracted from one page.
    Inspect {
        /// Notion page id.
        id: String,
    },

    /// Start the HTTP trigger.
    ///
    /// Binds to `[server].bind`; each `GET /api/process` runs the pipeline once.
    Serve,

    /// Run the pipeline every `--interval` seconds until interrupted.
    Watch {
        /// Seconds between runs.
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config::load_config(&cli.config)?;
    let credentials = Credentials::from_env(&cfg)?;
    let drafter = Drafter::from_config(&cfg, &credentials)?;

    match cli.command {
        Commands::Run { dry_run } => {
            run_cmd::run_once(&drafter, dry_run).await?;
        }
        Commands::Inspect { id } => {
            run_cmd::run_inspect(&drafter, &id).await?;
        }
        Commands::Serve => {
            server::run_server(drafter).await?;
        }
        Commands::Watch { interval } => {
            watch::run_watch(&drafter, interval).await?;
        }
    }

    Ok(())
}
