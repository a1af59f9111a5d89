mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trailcap_engine::config::ConfigLoader;

#[derive(Parser)]
#[command(name = "trailcap", version, about = "Session capture timeline builder")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (default: ./trailcap.yaml, then ~/.trailcap/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Build timelines from a recorded JSON-lines notification file
    Replay {
        file: PathBuf,
        /// Export file, or directory for one file per recording
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print a one-line-per-entry summary
        #[arg(long)]
        summary: bool,
    },
    /// Record notifications streamed on stdin until EOF or ctrl-c
    Record {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarize a previously exported timeline
    Summary { export: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep stdout for exported JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ConfigLoader::load(args.config.as_deref()).await?;

    match args.command {
        Command::Replay {
            file,
            output,
            summary,
        } => commands::replay(&config, &file, output.as_deref(), summary).await,
        Command::Record { output } => commands::record(&config, output.as_deref()).await,
        Command::Summary { export } => commands::summary(&export).await,
    }
}
