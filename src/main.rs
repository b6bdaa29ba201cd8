use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pickwatch::commands;
use pickwatch::config::Config;

#[derive(Parser)]
#[command(
    name = "pickwatch",
    version,
    about = "Retail store pickup availability watcher with transition notifications",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the config file's setting
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watcher loop and the control API until interrupted
    Run,

    /// Probe all enabled items once and print a status table
    Check,

    /// Seed tracked items from a text file, one product reference per line
    Import {
        /// File to read references from
        file: PathBuf,

        /// Location token applied to every imported item
        #[arg(short, long, default_value = "110001")]
        location: String,
    },
}

fn init_logging(level: &str, verbose: bool, format: &str) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pickwatch={level},tower_http=warn")));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    init_logging(&config.logging.level, cli.verbose, &format);

    match cli.command {
        Commands::Run => commands::run(config).await,
        Commands::Check => commands::check(config).await,
        Commands::Import { file, location } => commands::import(config, &file, &location).await,
    }
}
