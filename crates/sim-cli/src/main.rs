use anyhow::{Context, Result};
use clap::Parser;
use sim_core::config::{load_diet_config_file, load_fauna_config_file};
use sim_core::SimConfig;
use std::path::PathBuf;

/// Run the marine ecosystem engine headlessly and print the resulting
/// per-tick population history as JSON.
#[derive(Parser, Debug)]
#[command(name = "sim-cli", version, about)]
struct Args {
    /// Path to the simulation-parameters JSON file.
    #[arg(long)]
    sim_config: PathBuf,

    /// Path to the fauna-archetype JSON file.
    #[arg(long)]
    fauna_config: PathBuf,

    /// Path to the predator/prey diet JSON file.
    #[arg(long)]
    diet_config: PathBuf,

    /// PRNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to run; defaults to the value in sim_config.
    #[arg(long)]
    ticks: Option<u64>,

    /// Write history to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let sim_config = SimConfig::from_file(&args.sim_config)
        .with_context(|| format!("loading sim config from {}", args.sim_config.display()))?;
    let fauna_config = load_fauna_config_file(&args.fauna_config)
        .with_context(|| format!("loading fauna config from {}", args.fauna_config.display()))?;
    let diet_config = load_diet_config_file(&args.diet_config)
        .with_context(|| format!("loading diet config from {}", args.diet_config.display()))?;
    let ticks = args.ticks.unwrap_or(sim_config.simulation_ticks);

    let mut engine = sim_core::create(sim_config, fauna_config, diet_config, args.seed)
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("constructing engine")?;

    tracing::info!(ticks, seed = args.seed, "starting headless run");
    let history = sim_core::run_headless(&mut engine, ticks);
    tracing::info!(ticks_run = history.len(), "run complete");

    let rendered = serde_json::to_string_pretty(&history)?;
    match args.output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("writing history to {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
