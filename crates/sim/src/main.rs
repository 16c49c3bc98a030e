mod scenario;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use windoc_core::ServiceConfig;

use crate::scenario::Scenario;

/// Replay a window scenario against the metrics service and print what it
/// reports after every step, one JSON object per line.
#[derive(Parser)]
#[command(name = "windoc-sim", about = "Headless window metrics simulator")]
struct Cli {
    /// Scenario JSON file.
    scenario: PathBuf,

    /// Service config JSON file. Overrides the scenario's own `config`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print each report.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data = std::fs::read_to_string(&cli.scenario)
        .with_context(|| format!("reading {}", cli.scenario.display()))?;
    let mut scenario: Scenario = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", cli.scenario.display()))?;
    if let Some(path) = &cli.config {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        scenario.config = Some(ServiceConfig::from_json(&data)?);
    }

    let reports = scenario::run(&scenario)?;
    tracing::info!(steps = reports.len(), "scenario finished");

    let mut out = std::io::stdout().lock();
    for report in &reports {
        let line = if cli.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        writeln!(out, "{line}")?;
    }
    Ok(())
}
