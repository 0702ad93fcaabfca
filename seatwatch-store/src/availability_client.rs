use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use seatwatch_core::{AvailabilityError, AvailabilityRecord, AvailabilitySource, ItinerarySnapshot};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Availability lookups over a small JSON HTTP contract:
/// `POST /v1/availability/search` with criteria and
/// `POST /v1/availability/refresh` with a saved itinerary document.
pub struct HttpAvailabilitySource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    origin: &'a str,
    destination: &'a str,
    departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cabin_class: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

impl HttpAvailabilitySource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_refresh(&self, document: &serde_json::Value) -> Result<AvailabilityRecord, reqwest::Error> {
        let envelope: Envelope<AvailabilityRecord> = self
            .client
            .post(self.url("/v1/availability/refresh"))
            .json(document)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl AvailabilitySource for HttpAvailabilitySource {
    async fn search_by_criteria(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        cabin_class: Option<&str>,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError> {
        let request = SearchRequest {
            origin,
            destination,
            departure_date: date.format("%Y-%m-%d").to_string(),
            cabin_class,
        };

        let response = self
            .client
            .post(self.url("/v1/availability/search"))
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AvailabilityError::Upstream(e.to_string()))?;

        let envelope: Envelope<Vec<AvailabilityRecord>> = response
            .json()
            .await
            .map_err(|e| AvailabilityError::Upstream(format!("unreadable search response: {}", e)))?;

        debug!("Search {} -> {} on {} returned {} records", origin, destination, date, envelope.data.len());
        Ok(envelope.data)
    }

    async fn refresh_single_itinerary(
        &self,
        snapshot: &ItinerarySnapshot,
    ) -> Result<AvailabilityRecord, AvailabilityError> {
        let document = snapshot.document()?;

        // The itinerary was bookable when saved, so any failure here is transient.
        self.post_refresh(&document).await.map_err(|e| {
            warn!("Itinerary refresh failed: {}", e);
            AvailabilityError::TemporarilyUnavailable(e.to_string())
        })
    }
}
