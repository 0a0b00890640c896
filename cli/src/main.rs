#![deny(missing_docs)]

//! # rpc2oas CLI
//!
//! Command Line Interface for the route-registry -> OpenAPI generator.
//!
//! Supported Commands:
//! - `generate`: Reads a router definition (YAML/JSON) and writes an OpenAPI 3.0.3 document.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod error;
mod generate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "RPC router -> OpenAPI generator")]
struct Cli {
    /// Log progress at info level (overridden by RUST_LOG).
    #[clap(long, short, global = true, env = "RPC2OAS_VERBOSE")]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an OpenAPI document from a router definition file.
    Generate(generate::GenerateArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Generate(args) => generate::execute(args),
    }
}

/// Logs go to stderr so stdout carries only the generated document.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
