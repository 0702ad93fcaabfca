use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::{AlertConfig, TriggerRecord};
use crate::itinerary::ItinerarySnapshot;

/// Saved searches lapse after 30 days.
const SAVED_SEARCH_TTL_DAYS: i64 = 30;

/// A user's interest in one flight or in a route/date search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub kind: WatchKind,
    pub alert: Option<AlertConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchKind {
    SingleFlight { snapshot: ItinerarySnapshot },
    SavedSearch(SearchCriteria),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub cabin_class: Option<String>,
    pub airline_filter: Option<String>,
}

impl SearchCriteria {
    /// Airline filter with surrounding whitespace removed; blank counts as absent.
    pub fn airline_prefix(&self) -> Option<&str> {
        self.airline_filter
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

impl Watch {
    pub fn single_flight(owner_id: impl Into<String>, title: impl Into<String>, snapshot: ItinerarySnapshot) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            title: title.into(),
            kind: WatchKind::SingleFlight { snapshot },
            alert: None,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    pub fn saved_search(owner_id: impl Into<String>, title: impl Into<String>, criteria: SearchCriteria) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            title: title.into(),
            kind: WatchKind::SavedSearch(criteria),
            alert: None,
            created_at: now,
            updated_at: now,
            expires_at: Some(now + Duration::days(SAVED_SEARCH_TTL_DAYS)),
        }
    }

    pub fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.alert = Some(AlertConfig::with_threshold(threshold));
        self
    }

    pub fn threshold(&self) -> Option<f64> {
        self.alert.as_ref().and_then(|alert| alert.threshold)
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            WatchKind::SingleFlight { .. } => "SINGLE_FLIGHT",
            WatchKind::SavedSearch(_) => "SAVED_SEARCH",
        }
    }

    /// Departure of the watched flight: midnight UTC of the search date, or the
    /// first segment's departure of the saved itinerary.
    pub fn departure_time(&self) -> Option<DateTime<Utc>> {
        match &self.kind {
            WatchKind::SavedSearch(criteria) => Some(midnight_utc(criteria.departure_date)),
            WatchKind::SingleFlight { snapshot } => snapshot.first_departure().ok(),
        }
    }

    /// Earliest departure across all segments, used when selecting active watches.
    pub fn earliest_departure(&self) -> Option<DateTime<Utc>> {
        match &self.kind {
            WatchKind::SavedSearch(criteria) => Some(midnight_utc(criteria.departure_date)),
            WatchKind::SingleFlight { snapshot } => snapshot.earliest_departure().ok().flatten(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Enabled, unexpired, and departing inside `(now, now + lookahead)`.
    /// Watches with an unknown departure are kept so they are never silently dropped.
    pub fn is_active_at(&self, now: DateTime<Utc>, lookahead: Duration) -> bool {
        let enabled = self.alert.as_ref().is_some_and(AlertConfig::is_enabled);
        if !enabled || self.is_expired_at(now) {
            return false;
        }

        match self.earliest_departure() {
            Some(departure) => departure > now && departure < now + lookahead,
            None => true,
        }
    }

    pub fn record_evaluated(&mut self, now: DateTime<Utc>) {
        if let Some(alert) = self.alert.as_mut() {
            alert.record_evaluated(now);
        }
    }

    pub fn record_trigger(&mut self, record: TriggerRecord, history_limit: usize) {
        if let Some(alert) = self.alert.as_mut() {
            alert.record_trigger(record, history_limit);
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
