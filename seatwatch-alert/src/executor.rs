use std::sync::Arc;

use seatwatch_core::{AvailabilityError, AvailabilityRecord, AvailabilitySource, Watch, WatchKind};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Upstream(#[from] AvailabilityError),

    #[error("No availability returned for watch {0}")]
    EmptyResult(uuid::Uuid),
}

/// Runs the one upstream fetch for a group, driven by its representative watch.
pub struct SearchExecutor {
    source: Arc<dyn AvailabilitySource>,
}

impl SearchExecutor {
    pub fn new(source: Arc<dyn AvailabilitySource>) -> Self {
        Self { source }
    }

    /// Criteria search for saved searches; a one-element batch holding the
    /// refreshed itinerary for single flights. An empty batch is an error so
    /// the caller skips the group.
    pub async fn run(&self, representative: &Watch) -> Result<Vec<AvailabilityRecord>, ExecutorError> {
        let batch = match &representative.kind {
            WatchKind::SavedSearch(criteria) => {
                debug!(
                    "Searching {} -> {} on {} for watch {}",
                    criteria.origin, criteria.destination, criteria.departure_date, representative.id
                );
                self.source
                    .search_by_criteria(
                        &criteria.origin,
                        &criteria.destination,
                        criteria.departure_date,
                        criteria.cabin_class.as_deref(),
                    )
                    .await?
            }
            WatchKind::SingleFlight { snapshot } => {
                debug!("Refreshing saved itinerary for watch {}", representative.id);
                vec![self.source.refresh_single_itinerary(snapshot).await?]
            }
        };

        if batch.is_empty() {
            return Err(ExecutorError::EmptyResult(representative.id));
        }

        Ok(batch)
    }
}
