//! # Pegel Tracker Application Entry Point
//!
//! This binary wires configuration, logging, the gauge source, the slogan pools and
//! the status dispatcher into a [`Monitor`] and runs its polling loop until SIGINT
//! or SIGTERM.
//!
//! ## Flags
//! - `--dry-run`: log posts instead of publishing them, whatever the config says
//! - `--once`: run a single poll cycle and exit

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{ensure, Context};
use pegel_lib::{
    config::Config,
    dispatch::StatusDispatcher,
    logging,
    monitor::{Monitor, MonitorSettings},
    source::HttpGauge,
};
use rand::{rngs::StdRng, SeedableRng};
use std::env;
use tracing::info;

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let force_dry_run = env::args().any(|arg| arg == "--dry-run");
    let run_once = env::args().any(|arg| arg == "--once");

    // Configuration and log file problems are the only fatal errors
    let (mut config, origin) = Config::load().context("loading configuration")?;
    if force_dry_run {
        config.dispatch.dry_run = true;
    }
    ensure!(
        !config.gauge.url.is_empty(),
        "gauge.url is not configured (config file: {})",
        Config::path_from_env().display()
    );

    logging::init(&config.logging).context("initializing logging")?;
    origin.log();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        gauge = %config.gauge.url,
        dry_run = config.dispatch.dry_run,
        "started"
    );

    let source = HttpGauge::new(config.gauge.url.clone(), config.gauge_timeout())
        .context("building gauge client")?;
    let dispatcher = StatusDispatcher::new(
        config.dispatch.endpoint.clone(),
        config.dispatch.access_token.clone(),
    )
    .context("building status client")?;

    let mut monitor = Monitor::new(
        source,
        dispatcher,
        config.messages.pools.clone(),
        MonitorSettings::from_config(&config),
        StdRng::from_entropy(),
    );

    // Single sequential loop, no worker threads needed
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    rt.block_on(async {
        if run_once {
            let outcome = monitor.tick(chrono::Utc::now()).await;
            info!(?outcome, "single tick finished");
        } else {
            monitor.run(config.poll_interval(), shutdown_signal()).await;
        }
    });

    info!("stopped");
    Ok(())
}
