//! Log output for the soak run.
//!
//! The engine crates log through the `log` facade. [`init`] forwards those records into
//! `tracing` and prints everything with a `tracing-subscriber` formatter.

use anyhow::Context;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides `default_filter` when set.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter {default_filter:?}"))?,
    };

    LogTracer::init().context("a log bridge is already installed")?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("a tracing subscriber is already installed")?;
    Ok(())
}
