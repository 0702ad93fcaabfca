use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::itinerary::{FlightIdentity, ItinerarySnapshot, OfferView, SnapshotError};

/// One fetched itinerary with its current bookable-seat count. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    pub id: String,
    #[serde(rename = "numberOfBookableSeats")]
    pub bookable_seats: u32,
    #[serde(default)]
    pub itineraries: Vec<Value>,
    #[serde(default)]
    pub validating_airline_codes: Option<Vec<String>>,
}

impl AvailabilityRecord {
    pub fn view(&self) -> OfferView<'_> {
        OfferView::from_itineraries(&self.itineraries)
    }

    pub fn identity(&self) -> Result<FlightIdentity, SnapshotError> {
        self.view().identity()
    }

    /// True when any validating airline code starts with `prefix`.
    /// A record without codes never matches.
    pub fn matches_airline_prefix(&self, prefix: &str) -> bool {
        self.validating_airline_codes
            .as_ref()
            .is_some_and(|codes| codes.iter().any(|code| code.starts_with(prefix)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// The itinerary was bookable when saved, so a failed refresh is treated as transient.
    #[error("Availability temporarily unavailable: {0}")]
    TemporarilyUnavailable(String),

    #[error("Upstream availability search failed: {0}")]
    Upstream(String),

    #[error("Saved itinerary cannot be refreshed: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
}

#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Criteria search; returns every matching itinerary.
    async fn search_by_criteria(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        cabin_class: Option<&str>,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError>;

    /// Fresh availability for exactly the saved itinerary.
    async fn refresh_single_itinerary(
        &self,
        snapshot: &ItinerarySnapshot,
    ) -> Result<AvailabilityRecord, AvailabilityError>;
}
