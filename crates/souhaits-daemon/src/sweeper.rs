//! Garbage collection timer.
//!
//! One sweep at start-up, then one every configured interval. Sweeps run on
//! the blocking pool since they hold the database lock for the whole
//! transaction.

use std::sync::Arc;
use std::time::Duration;

use souhaits_core::Service;
use souhaits_db::queries::gc::SweepReport;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Run a single sweep off the async runtime.
pub async fn sweep_once(service: Arc<Service>) -> anyhow::Result<SweepReport> {
    let report = tokio::task::spawn_blocking(move || service.collect_garbage()).await??;
    Ok(report)
}

/// Sweep forever. Failures are logged and the next tick tries again.
pub async fn run(service: Arc<Service>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_secs = period.as_secs(), "garbage collector scheduled");
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(service.clone()).await {
            error!("garbage collection failed: {e}");
        }
    }
}
