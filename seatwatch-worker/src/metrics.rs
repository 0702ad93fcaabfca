use prometheus::{IntCounter, Registry, TextEncoder};
use seatwatch_alert::RunSummary;

/// Counters for alert runs, kept in a registry of their own.
#[derive(Clone)]
pub struct AlertMetrics {
    registry: Registry,
    runs: IntCounter,
    watches_processed: IntCounter,
    notifications_sent: IntCounter,
    groups_skipped: IntCounter,
    run_failures: IntCounter,
}

impl AlertMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let runs = IntCounter::new("seatwatch_runs_total", "Completed alert runs")?;
        let watches_processed = IntCounter::new(
            "seatwatch_watches_processed_total",
            "Watches evaluated across all runs",
        )?;
        let notifications_sent = IntCounter::new(
            "seatwatch_notifications_sent_total",
            "Alert notifications delivered",
        )?;
        let groups_skipped = IntCounter::new(
            "seatwatch_groups_skipped_total",
            "Fetch groups skipped after an upstream failure",
        )?;
        let run_failures = IntCounter::new(
            "seatwatch_run_failures_total",
            "Runs that could not load active watches",
        )?;

        for counter in [&runs, &watches_processed, &notifications_sent, &groups_skipped, &run_failures] {
            registry.register(Box::new(counter.clone()))?;
        }

        Ok(Self {
            registry,
            runs,
            watches_processed,
            notifications_sent,
            groups_skipped,
            run_failures,
        })
    }

    pub fn record_run(&self, summary: &RunSummary) {
        self.runs.inc();
        self.watches_processed.inc_by(summary.processed as u64);
        self.notifications_sent.inc_by(summary.triggered as u64);
        self.groups_skipped.inc_by(summary.groups_skipped as u64);
    }

    pub fn record_failure(&self) {
        self.run_failures.inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
