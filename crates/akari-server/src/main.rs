//! AKARI CLI - crypto-community engagement accounting service.
//!
//! Command-line interface for running the AKARI HTTP service and inspecting
//! its accounting policies.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

mod auth;
mod commands;

/// AKARI: points, predictions, MYST burns and leaderboards.
#[derive(Parser)]
#[command(name = "akari")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "AKARI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output directory for config
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Overwrite an existing config
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Run the HTTP service
    Serve {
        /// Listen address
        #[arg(long, default_value = "127.0.0.1:8686")]
        addr: SocketAddr,

        /// Data directory for the ledger snapshot and settlement log
        #[arg(long, default_value = ".akari")]
        store_dir: PathBuf,

        /// Allow running admin endpoints without an API key.
        ///
        /// Required when `AKARI_ADMIN_API_KEY` is unset, since an unkeyed
        /// deployment lets anyone resolve predictions and move points.
        #[arg(long, default_value_t = false)]
        insecure_demo: bool,
    },

    /// Show the tier a points balance maps to
    Tier {
        /// Balance in raw points units (1000 = 1 point)
        #[arg(long)]
        points: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.clone())?;
    init_tracing(cli.verbose, &config.logging.level);

    match cli.command {
        Commands::Init { output, force } => commands::run_init(&output, force),
        Commands::Serve {
            addr,
            store_dir,
            insecure_demo,
        } => commands::serve::run(addr, store_dir, insecure_demo, config).await,
        Commands::Tier { points } => commands::run_tier(&config, points),
    }
}

fn init_tracing(verbose: bool, level: &str) {
    let default = if verbose { "debug" } else { level };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
