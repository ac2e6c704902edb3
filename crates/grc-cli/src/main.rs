//! # grc CLI entry point
//!
//! Parses command-line arguments, installs logging, loads the engine
//! configuration and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use grc_cli::assess::{run_assess, AssessArgs};
use grc_cli::coverage::{run_coverage, CoverageArgs};
use grc_cli::gaps::{run_gaps, GapsArgs};
use grc_cli::load_config;
use grc_cli::mappings::{run_mappings, MappingsArgs};

/// GRC compliance mapping and fulfillment scoring.
///
/// Assesses tenants against compliance frameworks from their control
/// implementation state, analyses cross-framework mappings and reports gaps.
#[derive(Parser, Debug)]
#[command(name = "grc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute a tenant's fulfillment of a framework from its controls.
    Assess(AssessArgs),

    /// Analyse mapping quality and report final percentages.
    Mappings(MappingsArgs),

    /// Identify gaps in every mapping and summarise them.
    Gaps(GapsArgs),

    /// Report how far one framework's mappings cover another.
    Coverage(CoverageArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Assess(args) => run_assess(args, &config),
        Commands::Mappings(args) => run_mappings(args, &config),
        Commands::Gaps(args) => run_gaps(args, &config),
        Commands::Coverage(args) => run_coverage(args),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
