use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::context;
use crate::cli::Cli;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::services::cycle::CycleService;

/// Execute the `keysync run` command: the unattended daemon.
///
/// One cycle per interval tick, forever. Failures are contained within
/// their cycle — a bad cycle is logged and the loop keeps going. Only
/// invalid configuration stops the process, and only at startup.
pub fn execute(cli: &Cli, interval: Option<u64>) -> Result<()> {
    init_tracing();

    let config = AppConfig::resolve(cli, interval)?;
    let cycle = Arc::new(context::cycle_service(&config)?);
    let rt = context::runtime()?;

    rt.block_on(run_loop(&config, cycle))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keysync=info")),
        )
        .init();
}

async fn run_loop(config: &AppConfig, cycle: Arc<CycleService>) -> Result<()> {
    info!(
        custodian = %config.custodian_url,
        client = %config.client_url,
        interval_secs = config.interval.as_secs(),
        "keysync daemon started"
    );

    // Single-flight guard: a tick that fires while a cycle is still
    // running (slow network) is skipped, never run concurrently.
    // Concurrent cycles could race on the client's mutable key set.
    let guard = Arc::new(tokio::sync::Mutex::new(()));

    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Ok(lease) = Arc::clone(&guard).try_lock_owned() else {
            warn!("previous cycle still in flight; skipping this tick");
            continue;
        };

        let cycle = Arc::clone(&cycle);
        tokio::spawn(async move {
            let _lease = lease;
            match cycle.run_cycle().await {
                Ok(report) => info!(
                    started_at = %report.started_at.to_rfc3339(),
                    custodian_keys = report.custodian_keys,
                    client_keys = report.client_keys,
                    added = report.added(),
                    removed = report.removed(),
                    failed = report.failed(),
                    duration_ms = report.duration.as_millis() as u64,
                    "cycle complete"
                ),
                Err(e) => warn!(error = %e, "cycle aborted; retrying on next tick"),
            }
        });
    }
}
