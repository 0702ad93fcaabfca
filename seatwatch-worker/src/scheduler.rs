use std::time::Duration;

use seatwatch_alert::{OrchestratorError, RunSummary};
use tokio::time::sleep;
use tracing::{error, info};

use crate::state::AppState;

/// One orchestrator pass with metrics recorded. Errors are logged here so
/// callers may drop them.
pub async fn execute_run(state: &AppState, trigger: &'static str) -> Result<RunSummary, OrchestratorError> {
    info!("Starting alert run ({})", trigger);
    match state.orchestrator.run().await {
        Ok(summary) => {
            state.metrics.record_run(&summary);
            info!("Alert run finished ({}): {}", trigger, summary);
            Ok(summary)
        }
        Err(e) => {
            state.metrics.record_failure();
            error!("Alert run failed ({}): {}", trigger, e);
            Err(e)
        }
    }
}

/// Runs the pipeline on a fixed interval. Overlap with manual runs is not
/// prevented; the last write to a watch wins.
pub async fn start_scheduler(state: AppState, interval: Duration, run_on_start: bool) {
    info!("Alert scheduler started, running every {}s", interval.as_secs());

    if !run_on_start {
        sleep(interval).await;
    }

    loop {
        let _ = execute_run(&state, "scheduled").await;
        sleep(interval).await;
    }
}
