use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::time::Instant;

use fuzzy_merge::cli::Cli;
use fuzzy_merge::logging::init_logging;
use fuzzy_merge::orchestrator::{self, log_progress};
use fuzzy_merge::util::envfile::{load_dotenv_if_present, write_env_template};

fn main() {
    // .env first so clap's env fallbacks can see it
    if let Err(e) = load_dotenv_if_present() {
        eprintln!("Failed to load .env: {:#}", e);
        std::process::exit(2);
    }
    init_logging();

    let start = Instant::now();
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
    println!("Execution time: {} seconds", start.elapsed().as_secs_f64());
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.write_env_template {
        write_env_template(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote env template to {}", path.display());
        return Ok(());
    }
    let cfg = cli.to_app_config()?;
    info!(
        "fuzzy_merge: {} x {} -> {}",
        cfg.input.query_path.display(),
        cfg.input.reference_path.display(),
        cfg.export.out_path.display()
    );
    let summary = orchestrator::run(&cfg, log_progress)?;
    summary.log();
    Ok(())
}
