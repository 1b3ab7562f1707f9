//! Runs a lumen soak with the config named on the command line.

use std::path::PathBuf;

use anyhow::Context;
use lumen::{LumenConfig, config::DEFAULT_CONFIG_PATH, logger};

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = LumenConfig::load_or_create(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    logger::init(&config.log_filter)?;

    log::info!("Starting soak run with {}", path.display());
    let summary = lumen::run(&config).context("soak run failed")?;
    log::info!(
        "Finished: {} chunks, {} edits, {} increases, {} decreases, {} publications, {} reader snapshots",
        summary.chunks,
        summary.edits,
        summary.increases,
        summary.decreases,
        summary.published_sections,
        summary.snapshots
    );
    if let Some(voxels) = summary.verified_voxels {
        log::info!("All {voxels} voxels match a from-scratch relight");
    }
    Ok(())
}
