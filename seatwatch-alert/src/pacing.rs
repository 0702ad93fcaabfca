use std::time::Duration;

use async_trait::async_trait;

/// Spacing between consecutive upstream fetches.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Plain sleep of a fixed length. Not cancellable once started.
#[derive(Debug, Clone)]
pub struct FixedIntervalPacer {
    interval: Duration,
}

impl FixedIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Pacer for FixedIntervalPacer {
    async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// No spacing at all.
#[derive(Debug, Clone, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pause(&self) {}
}
