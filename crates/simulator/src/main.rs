use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use tranche_sim::{ScenarioConfig, Simulation};

#[derive(Parser, Debug)]
#[command(name = "tranche-sim")]
#[command(about = "Replay a tranched lending pool scenario")]
struct Args {
    /// Path to the scenario TOML file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a borsh snapshot of the final pool state here
    #[arg(short, long)]
    checkpoint: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let config = ScenarioConfig::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;

    let mut simulation = Simulation::new(config).context("Failed to build pool")?;
    let report = simulation.run();

    log::info!(
        "Scenario '{}' finished: {} steps, {} failed, pool {}",
        report.scenario,
        report.steps.len(),
        report.failed_steps(),
        report.status
    );

    match &args.output {
        Some(path) => {
            report
                .write(path)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{}", report.to_json()?),
    }

    if let Some(path) = &args.checkpoint {
        let bytes = simulation.checkpoint()?;
        fs::write(path, &bytes).with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        log::info!("Checkpoint ({} bytes) written to {}", bytes.len(), path.display());
    }

    if let Some(index) = report.halted_at {
        bail!("Scenario halted at step {}", index);
    }
    Ok(())
}
