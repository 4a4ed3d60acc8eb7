//! Enlight CLI - Command-line interface for the Enlight telemetry agent
//!
//! Provides commands for:
//! - Sending a captured error report to the collector
//! - Sending a log entry to the collector
//! - Viewing and validating configuration
//! - Generating shell completions

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use enlight_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    capture::CaptureCommand, completions::CompletionsCommand, config::ConfigCommand,
    log::LogCommand,
};
use output::{OutputFormat, Printer};

#[derive(Debug, Parser)]
#[command(name = "enlight", version, about = "Client telemetry agent for AppEnlight-compatible collectors")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only print warnings, errors and requested JSON
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a captured error (RawError JSON) as a report
    Capture(CaptureCommand),
    /// Send a log entry
    Log(LogCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let logging = Config::load_or_default(&config_path).logging;

    // Setup tracing
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "warn".to_string(),
        (false, 0) => logging.level.clone(),
        (false, 1) => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let printer = Printer::new(format, cli.quiet);

    match cli.command {
        Commands::Capture(cmd) => cmd.execute(&printer, &config_path).await,
        Commands::Log(cmd) => cmd.execute(&printer, &config_path).await,
        Commands::Config(cmd) => cmd.execute(&printer, &config_path).await,
        Commands::Completions(cmd) => cmd.execute(&printer).await,
    }
}
