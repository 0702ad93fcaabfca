use chrono::{DateTime, Duration, Utc};
use seatwatch_core::{EvaluationResult, Watch};

pub const DEFAULT_COOLDOWN_HOURS: i64 = 45;
pub const DEFAULT_URGENCY_WINDOW_HOURS: i64 = 3;

/// Anti-spam policy for triggered alerts.
///
/// A watch is notified the first time it triggers, then at most once per
/// cooldown, except that any trigger inside the urgency window before
/// departure always goes out.
#[derive(Debug, Clone)]
pub struct NotificationGate {
    cooldown: Duration,
    urgency_window: Duration,
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(
            Duration::hours(DEFAULT_COOLDOWN_HOURS),
            Duration::hours(DEFAULT_URGENCY_WINDOW_HOURS),
        )
    }
}

impl NotificationGate {
    pub fn new(cooldown: Duration, urgency_window: Duration) -> Self {
        Self {
            cooldown,
            urgency_window,
        }
    }

    pub fn should_notify(&self, watch: &Watch, result: &EvaluationResult, now: DateTime<Utc>) -> bool {
        if !result.is_triggered() {
            return false;
        }

        let Some(last_triggered) = watch.alert.as_ref().and_then(|alert| alert.last_triggered_at) else {
            return true;
        };

        // Departures already in the past also count as imminent.
        if let Some(departure) = watch.departure_time() {
            if departure < now + self.urgency_window {
                return true;
            }
        }

        last_triggered <= now - self.cooldown
    }
}
