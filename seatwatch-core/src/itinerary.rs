//! Field-path access into itinerary documents.
//!
//! Saved itinerary snapshots and fetched availability records share the same
//! upstream shape (`itineraries[].segments[]` with `departure`/`arrival`
//! endpoints and an optional `operating` carrier). Every path into that shape
//! lives here; callers never index the JSON themselves.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Itinerary snapshot is not valid JSON: {0}")]
    Malformed(String),

    #[error("Missing field in itinerary: {0}")]
    MissingField(&'static str),

    #[error("Invalid departure timestamp: {0}")]
    InvalidTimestamp(String),
}

/// The five fields used to recognise the same physical flight across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlightIdentity {
    pub carrier_code: String,
    pub number: String,
    pub departure_date: String,
    pub origin: String,
    pub destination: String,
}

impl FlightIdentity {
    /// Display form such as `UA123`.
    pub fn flight_designator(&self) -> String {
        format!("{}{}", self.carrier_code, self.number)
    }
}

/// Origin of the first segment, arrival of the last one, date of first departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteKey {
    pub origin: String,
    pub final_destination: String,
    pub departure_date: String,
}

/// Opaque serialized itinerary captured when a single-flight watch was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItinerarySnapshot(String);

impl ItinerarySnapshot {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn document(&self) -> Result<Value, SnapshotError> {
        serde_json::from_str(&self.0).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    pub fn identity(&self) -> Result<FlightIdentity, SnapshotError> {
        let doc = self.document()?;
        OfferView::from_document(&doc)?.identity()
    }

    pub fn route_key(&self) -> Result<RouteKey, SnapshotError> {
        let doc = self.document()?;
        OfferView::from_document(&doc)?.route_key()
    }

    pub fn first_departure(&self) -> Result<DateTime<Utc>, SnapshotError> {
        let doc = self.document()?;
        OfferView::from_document(&doc)?.first_departure()
    }

    pub fn earliest_departure(&self) -> Result<Option<DateTime<Utc>>, SnapshotError> {
        let doc = self.document()?;
        Ok(OfferView::from_document(&doc)?.earliest_departure())
    }
}

/// Borrowed view over the `itineraries` array of an offer document.
#[derive(Debug, Clone, Copy)]
pub struct OfferView<'a> {
    itineraries: &'a [Value],
}

impl<'a> OfferView<'a> {
    pub fn from_document(doc: &'a Value) -> Result<Self, SnapshotError> {
        let itineraries = doc
            .get("itineraries")
            .and_then(Value::as_array)
            .ok_or(SnapshotError::MissingField("itineraries"))?;
        Ok(Self { itineraries })
    }

    pub fn from_itineraries(itineraries: &'a [Value]) -> Self {
        Self { itineraries }
    }

    fn segments(&self) -> Result<&'a [Value], SnapshotError> {
        self.itineraries
            .first()
            .and_then(|itinerary| itinerary.get("segments"))
            .and_then(Value::as_array)
            .filter(|segments| !segments.is_empty())
            .map(Vec::as_slice)
            .ok_or(SnapshotError::MissingField("itineraries[0].segments"))
    }

    fn first_segment(&self) -> Result<&'a Value, SnapshotError> {
        self.segments()?
            .first()
            .ok_or(SnapshotError::MissingField("itineraries[0].segments[0]"))
    }

    /// Identity of the first segment. Operating carrier and number win over
    /// the marketing ones, field by field.
    pub fn identity(&self) -> Result<FlightIdentity, SnapshotError> {
        let segment = self.first_segment()?;
        let operating = segment.get("operating");

        let carrier_code = operating
            .and_then(|op| text(op, "carrierCode"))
            .or_else(|| text(segment, "carrierCode"))
            .ok_or(SnapshotError::MissingField("carrierCode"))?;
        let number = operating
            .and_then(|op| text(op, "number"))
            .or_else(|| text(segment, "number"))
            .ok_or(SnapshotError::MissingField("number"))?;

        let departure = segment
            .get("departure")
            .ok_or(SnapshotError::MissingField("departure"))?;
        let arrival = segment
            .get("arrival")
            .ok_or(SnapshotError::MissingField("arrival"))?;

        let departure_at = text(departure, "at").ok_or(SnapshotError::MissingField("departure.at"))?;
        let origin = text(departure, "iataCode").ok_or(SnapshotError::MissingField("departure.iataCode"))?;
        let destination = text(arrival, "iataCode").ok_or(SnapshotError::MissingField("arrival.iataCode"))?;

        Ok(FlightIdentity {
            carrier_code,
            number,
            departure_date: date_part(&departure_at)?,
            origin,
            destination,
        })
    }

    pub fn route_key(&self) -> Result<RouteKey, SnapshotError> {
        let segments = self.segments()?;
        let first = &segments[0];
        let last = &segments[segments.len() - 1];

        let origin = first
            .get("departure")
            .and_then(|d| text(d, "iataCode"))
            .ok_or(SnapshotError::MissingField("departure.iataCode"))?;
        let final_destination = last
            .get("arrival")
            .and_then(|a| text(a, "iataCode"))
            .ok_or(SnapshotError::MissingField("arrival.iataCode"))?;
        let departure_at = first
            .get("departure")
            .and_then(|d| text(d, "at"))
            .ok_or(SnapshotError::MissingField("departure.at"))?;

        Ok(RouteKey {
            origin,
            final_destination,
            departure_date: date_part(&departure_at)?,
        })
    }

    pub fn first_departure(&self) -> Result<DateTime<Utc>, SnapshotError> {
        let at = self
            .first_segment()?
            .get("departure")
            .and_then(|d| text(d, "at"))
            .ok_or(SnapshotError::MissingField("departure.at"))?;
        parse_departure(&at)
    }

    /// Earliest departure over every segment of every itinerary (outbound and
    /// return). Unparseable timestamps are skipped.
    pub fn earliest_departure(&self) -> Option<DateTime<Utc>> {
        self.itineraries
            .iter()
            .filter_map(|itinerary| itinerary.get("segments").and_then(Value::as_array))
            .flatten()
            .filter_map(|segment| segment.get("departure").and_then(|d| text(d, "at")))
            .filter_map(|at| parse_departure(&at).ok())
            .min()
    }
}

/// String or numeric leaf as text. Upstream sometimes sends flight numbers as numbers.
fn text(node: &Value, field: &str) -> Option<String> {
    match node.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn date_part(at: &str) -> Result<String, SnapshotError> {
    at.get(..10)
        .map(str::to_string)
        .ok_or_else(|| SnapshotError::InvalidTimestamp(at.to_string()))
}

/// Accepts RFC 3339, or a naive local timestamp which is read as UTC.
pub fn parse_departure(at: &str) -> Result<DateTime<Utc>, SnapshotError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(at) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(at, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(SnapshotError::InvalidTimestamp(at.to_string()))
}
