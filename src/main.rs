//! chips-aggregator - FindChips offer export CLI
//!
//! Runs the export pipeline for part numbers given on the command line or
//! streamed in as JSON export requests.

use anyhow::Result;
use chips_aggregator::commands::{ExportCommand, WorkerCommand};
use chips_aggregator::config::{Config, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chips-aggregator",
    version,
    about = "Export FindChips distributor offers to spreadsheets",
    long_about = "Fetches FindChips search results for electronic part numbers and exports the top offers per distributor."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Console output format (table, json, markdown, csv)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Directory export files are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "FINDCHIPS_PROXY")]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Keep a copy of every fetched page
    #[arg(long, global = true)]
    save_html: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export offers for one or more part numbers
    #[command(alias = "e")]
    Export {
        /// Part number(s) to export
        #[arg(required = true)]
        parts: Vec<String>,
    },

    /// Process JSON-line export requests from a file or stdin
    #[command(alias = "w")]
    Worker {
        /// Request file, one `{"partNumber": ...}` object per line (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Maximum concurrent exports
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if cli.save_html {
        config.save_html = true;
    }

    match cli.command {
        Commands::Export { parts } => {
            let cmd = ExportCommand::new(config);
            let output = cmd.execute(&parts).await?;
            println!("{}", output.text);

            if output.failures > 0 {
                anyhow::bail!("{} of {} exports failed", output.failures, parts.len());
            }
        }

        Commands::Worker { input, workers } => {
            if let Some(workers) = workers {
                config.workers = workers;
            }

            let cmd = WorkerCommand::new(config, input);
            let summary = cmd.execute().await?;
            println!("{}", summary);
        }
    }

    Ok(())
}
