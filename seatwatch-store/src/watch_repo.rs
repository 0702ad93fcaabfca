use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use seatwatch_core::{AlertConfig, ItinerarySnapshot, SearchCriteria, StoreError, Watch, WatchKind, WatchStore};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

const KIND_SINGLE_FLIGHT: &str = "SINGLE_FLIGHT";
const KIND_SAVED_SEARCH: &str = "SAVED_SEARCH";

pub struct PostgresWatchStore {
    pool: PgPool,
    lookahead: Duration,
}

impl PostgresWatchStore {
    pub fn new(pool: PgPool, lookahead: Duration) -> Self {
        Self { pool, lookahead }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WatchRow {
    id: Uuid,
    owner_id: String,
    title: String,
    kind: String,
    itinerary_snapshot: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    departure_date: Option<NaiveDate>,
    cabin_class: Option<String>,
    airline_filter: Option<String>,
    alert_config: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

fn corrupt(id: Uuid, reason: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl TryFrom<WatchRow> for Watch {
    type Error = StoreError;

    fn try_from(row: WatchRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            KIND_SINGLE_FLIGHT => {
                let raw = row
                    .itinerary_snapshot
                    .ok_or_else(|| corrupt(row.id, "single flight without itinerary snapshot"))?;
                WatchKind::SingleFlight {
                    snapshot: ItinerarySnapshot::new(raw),
                }
            }
            KIND_SAVED_SEARCH => {
                let origin = row.origin.ok_or_else(|| corrupt(row.id, "saved search without origin"))?;
                let destination = row
                    .destination
                    .ok_or_else(|| corrupt(row.id, "saved search without destination"))?;
                let departure_date = row
                    .departure_date
                    .ok_or_else(|| corrupt(row.id, "saved search without departure date"))?;
                WatchKind::SavedSearch(SearchCriteria {
                    origin,
                    destination,
                    departure_date,
                    cabin_class: row.cabin_class,
                    airline_filter: row.airline_filter,
                })
            }
            other => return Err(corrupt(row.id, format!("unknown watch kind {}", other))),
        };

        let alert = match row.alert_config {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value::<AlertConfig>(value)?),
        };

        Ok(Watch {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            kind,
            alert,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
        })
    }
}

#[async_trait]
impl WatchStore for PostgresWatchStore {
    async fn find_active_alert_watches(&self) -> Result<Vec<Watch>, StoreError> {
        let rows = sqlx::query_as::<_, WatchRow>(
            r#"
            SELECT id, owner_id, title, kind, itinerary_snapshot, origin, destination,
                   departure_date, cabin_class, airline_filter, alert_config,
                   created_at, updated_at, expires_at
            FROM watches
            WHERE alert_config IS NOT NULL
              AND alert_config->>'threshold' IS NOT NULL
              AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let now = Utc::now();
        let candidates = rows.len();
        let mut active = Vec::with_capacity(candidates);

        for row in rows {
            let id = row.id;
            match Watch::try_from(row) {
                Ok(watch) if watch.is_active_at(now, self.lookahead) => active.push(watch),
                Ok(_) => {}
                // One unreadable row must not hide every other watch.
                Err(e) => warn!("Skipping watch {}: {}", id, e),
            }
        }

        debug!("Selected {} active watches out of {} with alerts", active.len(), candidates);
        Ok(active)
    }

    async fn upsert(&self, watch: &Watch) -> Result<(), StoreError> {
        let alert_config = watch.alert.as_ref().map(serde_json::to_value).transpose()?;

        let (kind, snapshot, criteria) = match &watch.kind {
            WatchKind::SingleFlight { snapshot } => (KIND_SINGLE_FLIGHT, Some(snapshot.as_str()), None),
            WatchKind::SavedSearch(criteria) => (KIND_SAVED_SEARCH, None, Some(criteria)),
        };

        sqlx::query(
            r#"
            INSERT INTO watches (id, owner_id, title, kind, itinerary_snapshot, origin, destination,
                                 departure_date, cabin_class, airline_filter, alert_config,
                                 created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), $13)
            ON CONFLICT (id) DO UPDATE SET
                owner_id = EXCLUDED.owner_id,
                title = EXCLUDED.title,
                kind = EXCLUDED.kind,
                itinerary_snapshot = EXCLUDED.itinerary_snapshot,
                origin = EXCLUDED.origin,
                destination = EXCLUDED.destination,
                departure_date = EXCLUDED.departure_date,
                cabin_class = EXCLUDED.cabin_class,
                airline_filter = EXCLUDED.airline_filter,
                alert_config = EXCLUDED.alert_config,
                updated_at = NOW(),
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(watch.id)
        .bind(&watch.owner_id)
        .bind(&watch.title)
        .bind(kind)
        .bind(snapshot)
        .bind(criteria.map(|c| c.origin.as_str()))
        .bind(criteria.map(|c| c.destination.as_str()))
        .bind(criteria.map(|c| c.departure_date))
        .bind(criteria.and_then(|c| c.cabin_class.as_deref()))
        .bind(criteria.and_then(|c| c.airline_filter.as_deref()))
        .bind(alert_config)
        .bind(watch.created_at)
        .bind(watch.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}
