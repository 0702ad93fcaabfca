use axum::{extract::State, routing::post, Json, Router};
use seatwatch_alert::RunSummary;
use serde::Serialize;

use crate::error::AppError;
use crate::scheduler;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/alerts/run", post(run_alerts))
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub message: String,
    pub processed: usize,
    pub triggered: usize,
    pub groups: usize,
    pub groups_skipped: usize,
    pub suppressed: usize,
    pub delivery_failures: usize,
    pub persist_failures: usize,
}

impl From<&RunSummary> for RunResponse {
    fn from(summary: &RunSummary) -> Self {
        Self {
            message: summary.to_string(),
            processed: summary.processed,
            triggered: summary.triggered,
            groups: summary.groups,
            groups_skipped: summary.groups_skipped,
            suppressed: summary.suppressed,
            delivery_failures: summary.delivery_failures,
            persist_failures: summary.persist_failures,
        }
    }
}

/// Manual trigger; runs synchronously and reports the summary.
async fn run_alerts(State(state): State<AppState>) -> Result<Json<RunResponse>, AppError> {
    let summary = scheduler::execute_run(&state, "manual")
        .await
        .map_err(|e| AppError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(RunResponse::from(&summary)))
}
