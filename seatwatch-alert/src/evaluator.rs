use seatwatch_core::{AvailabilityRecord, EvaluationResult, ItinerarySnapshot, SearchCriteria, Watch, WatchKind};
use tracing::{debug, warn};

/// Seat capacity assumed for every saved-search result when turning a seat
/// count into a percentage. No per-aircraft capacity lookup is done.
pub const DEFAULT_ASSUMED_CAPACITY: f64 = 150.0;

/// Decides whether a watch's alert condition holds against a fetched batch.
///
/// Single flights alert on scarcity: seats strictly below an absolute count.
/// Saved searches alert on abundance: some flight with availability strictly
/// above a percentage. Stateless; the same inputs always give the same result.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    assumed_capacity: f64,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_ASSUMED_CAPACITY)
    }
}

impl AlertEvaluator {
    pub fn new(assumed_capacity: f64) -> Self {
        Self { assumed_capacity }
    }

    pub fn evaluate(&self, watch: &Watch, batch: &[AvailabilityRecord]) -> EvaluationResult {
        let Some(threshold) = watch.threshold() else {
            return EvaluationResult::NoAlert;
        };

        match &watch.kind {
            WatchKind::SingleFlight { snapshot } => self.evaluate_single_flight(watch, snapshot, batch, threshold),
            WatchKind::SavedSearch(criteria) => self.evaluate_saved_search(criteria, batch, threshold),
        }
    }

    fn evaluate_single_flight(
        &self,
        watch: &Watch,
        snapshot: &ItinerarySnapshot,
        batch: &[AvailabilityRecord],
        threshold: f64,
    ) -> EvaluationResult {
        let target = match snapshot.identity() {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Could not extract flight details for watch {}: {}", watch.id, e);
                return EvaluationResult::error("Could not extract flight details");
            }
        };

        // Records whose own identity cannot be read simply do not match.
        let matched = batch
            .iter()
            .find(|record| record.identity().is_ok_and(|identity| identity == target));

        let Some(record) = matched else {
            debug!(
                "Flight {} {}->{} on {} not in batch of {} for watch {}",
                target.flight_designator(),
                target.origin,
                target.destination,
                target.departure_date,
                batch.len(),
                watch.id
            );
            return EvaluationResult::error("Flight not found in search results");
        };

        let current_seats = f64::from(record.bookable_seats);
        if current_seats < threshold {
            EvaluationResult::Triggered {
                message: format!(
                    "Seat availability dropped to {} seats (below threshold of {:.0})",
                    record.bookable_seats, threshold
                ),
                current_value: current_seats,
                threshold,
                matched: record.clone(),
            }
        } else {
            EvaluationResult::NotTriggered {
                current_value: current_seats,
                threshold,
            }
        }
    }

    fn evaluate_saved_search(
        &self,
        criteria: &SearchCriteria,
        batch: &[AvailabilityRecord],
        threshold: f64,
    ) -> EvaluationResult {
        let airline = criteria.airline_prefix();

        // First qualifying record in batch order wins, not the best one.
        let first_above = batch
            .iter()
            .filter(|record| airline.is_none_or(|prefix| record.matches_airline_prefix(prefix)))
            .map(|record| (record, self.seat_percentage(record)))
            .find(|(_, percentage)| *percentage > threshold);

        match first_above {
            Some((record, percentage)) => EvaluationResult::Triggered {
                message: format!(
                    "Found flight with {:.1}% availability (above threshold of {:.1}%)",
                    percentage, threshold
                ),
                current_value: f64::from(record.bookable_seats),
                threshold,
                matched: record.clone(),
            },
            // No flight qualified: deliberately reports 0 rather than a best-seen value.
            None => EvaluationResult::NotTriggered {
                current_value: 0.0,
                threshold,
            },
        }
    }

    pub fn seat_percentage(&self, record: &AvailabilityRecord) -> f64 {
        if self.assumed_capacity <= 0.0 {
            return 0.0;
        }
        f64::from(record.bookable_seats) / self.assumed_capacity * 100.0
    }
}
