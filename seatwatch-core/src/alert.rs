use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRIGGER_HISTORY_LIMIT: usize = 10;

/// Alert state embedded in a watch.
///
/// The threshold is a bare number: seats for single-flight watches, a
/// percentage for saved searches. `None` disables alerting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub threshold: Option<f64>,
    #[serde(default)]
    pub last_evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_triggered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trigger_history: Vec<TriggerRecord>,
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub triggered_at: DateTime<Utc>,
    pub message: String,
    pub current_value: f64,
    pub threshold: f64,
}

impl AlertConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.threshold.is_some()
    }

    /// Stamped on every processing pass, triggered or not.
    pub fn record_evaluated(&mut self, now: DateTime<Utc>) {
        self.last_evaluated_at = Some(now);
    }

    /// Only called once a notification has actually gone out.
    pub fn record_trigger(&mut self, record: TriggerRecord, history_limit: usize) {
        self.last_triggered_at = Some(record.triggered_at);
        self.trigger_history.push(record);

        if self.trigger_history.len() > history_limit {
            let excess = self.trigger_history.len() - history_limit;
            self.trigger_history.drain(..excess);
        }
    }
}
