use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use seatwatch_core::{
    AvailabilityRecord, AvailabilitySource, EvaluationResult, NotificationSender, NotifyError, StoreError,
    TriggerRecord, UserStore, Watch, WatchStore, DEFAULT_TRIGGER_HISTORY_LIMIT,
};
use seatwatch_shared::Masked;
use tracing::{debug, error, info, warn};

use crate::evaluator::AlertEvaluator;
use crate::executor::SearchExecutor;
use crate::gate::NotificationGate;
use crate::grouping::{GroupKeyBuilder, WatchGroup};
use crate::pacing::{FixedIntervalPacer, Pacer};

const DEFAULT_GROUP_PACING: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Failed to load active watches: {0}")]
    LoadFailed(#[from] StoreError),
}

/// Counters for one run. Watches in skipped groups appear in none of them
/// apart from `groups_skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub active: usize,
    pub groups: usize,
    pub groups_skipped: usize,
    pub processed: usize,
    pub triggered: usize,
    pub suppressed: usize,
    pub delivery_failures: usize,
    pub persist_failures: usize,
}

impl RunSummary {
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No active alerts to process");
        }
        write!(
            f,
            "Processed {} alerts, triggered {} notifications",
            self.processed, self.triggered
        )
    }
}

/// Drives one full pass over every active watch.
///
/// Groups are fetched and evaluated strictly one after another with a pacing
/// pause in between. A failing group is skipped whole; a failing watch is
/// logged and the rest of its group still runs.
pub struct BatchOrchestrator {
    watches: Arc<dyn WatchStore>,
    users: Arc<dyn UserStore>,
    sender: Arc<dyn NotificationSender>,
    executor: SearchExecutor,
    evaluator: AlertEvaluator,
    gate: NotificationGate,
    keys: GroupKeyBuilder,
    pacer: Arc<dyn Pacer>,
    history_limit: usize,
}

impl BatchOrchestrator {
    pub fn new(
        watches: Arc<dyn WatchStore>,
        users: Arc<dyn UserStore>,
        sender: Arc<dyn NotificationSender>,
        source: Arc<dyn AvailabilitySource>,
    ) -> Self {
        Self {
            watches,
            users,
            sender,
            executor: SearchExecutor::new(source),
            evaluator: AlertEvaluator::default(),
            gate: NotificationGate::default(),
            keys: GroupKeyBuilder::new(),
            pacer: Arc::new(FixedIntervalPacer::new(DEFAULT_GROUP_PACING)),
            history_limit: DEFAULT_TRIGGER_HISTORY_LIMIT,
        }
    }

    pub fn with_evaluator(mut self, evaluator: AlertEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_gate(mut self, gate: NotificationGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    pub async fn run(&self) -> Result<RunSummary, OrchestratorError> {
        let active = self.watches.find_active_alert_watches().await?;
        let mut summary = RunSummary {
            active: active.len(),
            ..RunSummary::default()
        };

        if active.is_empty() {
            info!("No active alerts to process");
            return Ok(summary);
        }

        let groups = self.keys.group(active);
        summary.groups = groups.len();
        info!("Processing {} active watches in {} groups", summary.active, summary.groups);

        for (index, group) in groups.into_iter().enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }
            self.process_group(group, &mut summary).await;
        }

        info!(
            processed = summary.processed,
            triggered = summary.triggered,
            suppressed = summary.suppressed,
            groups_skipped = summary.groups_skipped,
            delivery_failures = summary.delivery_failures,
            persist_failures = summary.persist_failures,
            "{}",
            summary
        );
        Ok(summary)
    }

    async fn process_group(&self, group: WatchGroup, summary: &mut RunSummary) {
        let Some(representative) = group.representative() else {
            return;
        };

        let batch = match self.executor.run(representative).await {
            Ok(batch) => batch,
            Err(e) => {
                error!(group = %group.key, "Skipping group of {} watches: {}", group.watches.len(), e);
                summary.groups_skipped += 1;
                return;
            }
        };

        debug!(group = %group.key, "Fetched {} records for {} watches", batch.len(), group.watches.len());

        for watch in group.watches {
            self.process_watch(watch, &batch, summary).await;
        }
    }

    async fn process_watch(&self, mut watch: Watch, batch: &[AvailabilityRecord], summary: &mut RunSummary) {
        log_alert_state(&watch, "before_evaluate");

        let result = self.evaluator.evaluate(&watch, batch);
        summary.processed += 1;

        if let EvaluationResult::Error { message } = &result {
            warn!(watch_id = %watch.id, "Evaluation failed: {}", message);
        } else {
            debug!(watch_id = %watch.id, outcome = result.outcome(), "{}", result.message());
        }

        let now = Utc::now();
        watch.record_evaluated(now);
        log_alert_state(&watch, "after_evaluated");

        if result.is_triggered() {
            if self.gate.should_notify(&watch, &result, now) {
                match self.deliver(&watch, &result).await {
                    Ok(()) => {
                        watch.record_trigger(
                            TriggerRecord {
                                triggered_at: now,
                                message: result.message().to_string(),
                                current_value: result.current_value(),
                                threshold: result.threshold(),
                            },
                            self.history_limit,
                        );
                        summary.triggered += 1;
                        log_alert_state(&watch, "after_trigger");
                    }
                    Err(e) => {
                        error!(watch_id = %watch.id, "Notification not delivered: {}", e);
                        summary.delivery_failures += 1;
                    }
                }
            } else {
                info!(watch_id = %watch.id, "Alert triggered but suppressed by cooldown");
                summary.suppressed += 1;
            }
        }

        if let Err(e) = self.watches.upsert(&watch).await {
            error!(watch_id = %watch.id, "Failed to persist alert state: {}", e);
            summary.persist_failures += 1;
            return;
        }
        log_alert_state(&watch, "after_persist");
    }

    async fn deliver(&self, watch: &Watch, result: &EvaluationResult) -> Result<(), NotifyError> {
        let user = self
            .users
            .find_by_id(&watch.owner_id)
            .await
            .map_err(|e| NotifyError::Delivery(format!("recipient lookup failed: {}", e)))?
            .ok_or_else(|| NotifyError::RecipientNotFound(watch.owner_id.clone()))?;

        self.sender
            .send_alert(&user.email, &user.first_name, watch, result)
            .await?;

        info!(watch_id = %watch.id, "Alert sent to {}", Masked(&user.email));
        Ok(())
    }
}

fn log_alert_state(watch: &Watch, stage: &'static str) {
    let Some(alert) = watch.alert.as_ref() else {
        debug!(watch_id = %watch.id, stage, "No alert config");
        return;
    };
    debug!(
        watch_id = %watch.id,
        stage,
        kind = watch.kind_label(),
        threshold = ?alert.threshold,
        last_evaluated_at = ?alert.last_evaluated_at,
        last_triggered_at = ?alert.last_triggered_at,
        history_len = alert.trigger_history.len(),
        "Alert state"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        assert_eq!(RunSummary::default().to_string(), "No active alerts to process");

        let summary = RunSummary {
            active: 4,
            processed: 3,
            triggered: 1,
            ..RunSummary::default()
        };
        assert_eq!(summary.to_string(), "Processed 3 alerts, triggered 1 notifications");
    }
}
