use std::sync::Arc;

use seatwatch_alert::BatchOrchestrator;

use crate::metrics::AlertMetrics;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub metrics: AlertMetrics,
}
