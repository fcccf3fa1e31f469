//! catalogue-query - search a cloud provider catalogue from the terminal
//!
//! Loads a catalogue directory, indexes it on a background search worker
//! and prints ranked provider and service matches.

use catalogue_cli::output::Status;
use catalogue_telemetry::{metrics, TelemetryConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod load;

/// Fuzzy search over cloud provider catalogues
#[derive(Parser)]
#[command(name = "catalogue-query")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print collected metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    /// Search configuration file (TOML)
    #[arg(short, long, global = true, env = "CATALOGUE_SEARCH_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query
    Search {
        /// Query text
        query: String,

        /// Catalogue directory
        #[arg(short, long, env = "CATALOGUE_DATA")]
        data: PathBuf,
    },

    /// Read queries from stdin, one per line
    Interactive {
        /// Catalogue directory
        #[arg(short, long, env = "CATALOGUE_DATA")]
        data: PathBuf,
    },

    /// Summarize the catalogue by provider type
    Summary {
        /// Catalogue directory
        #[arg(short, long, env = "CATALOGUE_DATA")]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::for_verbosity(cli.verbose);
    telemetry.json = cli.log_json;
    if let Err(e) = catalogue_telemetry::init_with_config(telemetry) {
        Status::warning(&format!("Logging disabled: {e}"));
    }

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Search { query, data } => {
            commands::search::run(&query, &data, config, cli.json).await
        }
        Commands::Interactive { data } => commands::interactive::run(&data, config, cli.json).await,
        Commands::Summary { data } => commands::summary::run(&data, cli.json),
    };

    if cli.metrics {
        match serde_json::to_string_pretty(&metrics().snapshot()) {
            Ok(snapshot) => eprintln!("{snapshot}"),
            Err(e) => Status::warning(&format!("Could not serialize metrics: {e}")),
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Status::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
