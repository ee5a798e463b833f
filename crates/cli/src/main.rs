//! dbfixture CLI - Main Entry Point

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dbfixture::FixtureConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use dbfixture_cli::commands::{check, export, list, load, Context};
use dbfixture_cli::output;

/// dbfixture - Database fixtures for tests
#[derive(Parser)]
#[command(name = "dbfixture")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "dbfixture.toml", global = true, env = "DBFIXTURE_CONFIG")]
    config: PathBuf,

    /// Fixture directory, overriding fixtures.data-dir
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write current table contents to a fixture
    Export(export::ExportArgs),

    /// Clean-insert a fixture
    Load(load::LoadArgs),

    /// Compare tables against a fixture, exiting 1 on mismatch
    Check(check::CheckArgs),

    /// List fixtures in the data directory
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = FixtureConfig::load(&cli.config)
        .and_then(FixtureConfig::apply_env_overrides)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.fixtures.data_dir = dir;
    }
    debug!(
        "Using datasource {} with fixtures in {}",
        config.datasource.url,
        config.fixtures.data_dir.display()
    );

    let ctx = Context {
        config: Arc::new(config),
        format: cli.format,
    };

    match cli.command {
        Commands::Export(args) => export::execute(args, &ctx)?,
        Commands::Load(args) => load::execute(args, &ctx)?,
        Commands::Check(args) => {
            if !check::execute(args, &ctx)? {
                std::process::exit(1);
            }
        }
        Commands::List => list::execute(&ctx)?,
    }

    Ok(())
}
