//! CLI frontend for the mapwright transcript mapper.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use mw_store::{API_URL_ENV, DEFAULT_API_URL};
use mw_transcript::EngineConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mapwright",
    about = "Build a room map from a MUD session transcript",
    version
)]
struct Cli {
    /// Transcript log file to parse
    log: PathBuf,

    /// Zone id to use as the default zone instead of the first zone seen
    #[arg(long)]
    zone_id: Option<i64>,

    /// Write the parsed map as JSON to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Parse only; do not save to the map service
    #[arg(long)]
    no_save: bool,

    /// Base URL of the map service
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Word similarity (0.0-1.0) above which two long descriptions are one room
    #[arg(long, default_value = "0.98")]
    similarity: f64,

    /// Lost-concentration failures in a row before a room counts as no-magic
    #[arg(long, default_value = "3")]
    failure_limit: u32,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = commands::map::Options {
        log: cli.log,
        zone_id: cli.zone_id,
        export: cli.export,
        save: !cli.no_save,
        api_url: cli.api_url,
        timeout: cli.timeout,
        engine: EngineConfig::default()
            .with_similarity(cli.similarity)
            .with_failure_limit(cli.failure_limit),
    };

    if let Err(e) = commands::map::run(&options) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
