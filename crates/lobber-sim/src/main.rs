//! # Lobber
//!
//! Command-line throw simulator. Loads a scenario, computes the throw the
//! way an actor would, launches it and runs the physics until everything
//! has come to rest.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};

/// Simulates a thrown or launched item on a tile map
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario file
    #[arg(default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the physics table right after launch to this file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Write the default configuration to the scenario path and exit
    #[arg(long)]
    write_default_config: bool,
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lobber=info".parse()?))
        .init();

    if cli.write_default_config {
        SimConfig::default()
            .save_to(&cli.config)
            .with_context(|| format!("writing {}", cli.config.display()))?;
        return Ok(());
    }

    let mut config = SimConfig::load_from(&cli.config);
    if let Some(seed) = cli.seed {
        config.scenario.seed = seed;
    }

    let report = app::run(&config, cli.snapshot.as_deref())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            succeeded = report.prediction.succeeded,
            ticks = report.ticks,
            fates = ?report.fates,
            "simulation complete"
        );
    }
    Ok(())
}
