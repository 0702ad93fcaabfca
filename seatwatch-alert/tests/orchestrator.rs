use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use seatwatch_alert::{BatchOrchestrator, NoPacing, Pacer};
use seatwatch_core::{
    AvailabilityError, AvailabilityRecord, AvailabilitySource, EvaluationResult, ItinerarySnapshot,
    NotificationSender, NotifyError, SearchCriteria, StoreError, TriggerRecord, User, UserStore, Watch,
    WatchStore,
};
use uuid::Uuid;

#[derive(Default)]
struct InMemoryWatchStore {
    active: Mutex<Vec<Watch>>,
    saved: Mutex<Vec<Watch>>,
    reject: Option<Uuid>,
}

impl InMemoryWatchStore {
    fn with(watches: Vec<Watch>) -> Self {
        Self {
            active: Mutex::new(watches),
            ..Default::default()
        }
    }

    fn saved(&self, id: Uuid) -> Option<Watch> {
        self.saved.lock().unwrap().iter().find(|w| w.id == id).cloned()
    }

    fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl WatchStore for InMemoryWatchStore {
    async fn find_active_alert_watches(&self) -> Result<Vec<Watch>, StoreError> {
        Ok(self.active.lock().unwrap().clone())
    }

    async fn upsert(&self, watch: &Watch) -> Result<(), StoreError> {
        if self.reject == Some(watch.id) {
            return Err(StoreError::Database("connection reset".to_string()));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.retain(|w| w.id != watch.id);
        saved.push(watch.clone());
        Ok(())
    }
}

struct FixedUsers {
    known: Vec<User>,
}

impl FixedUsers {
    fn owner() -> Self {
        Self {
            known: vec![User {
                id: "owner".to_string(),
                email: "traveler@example.com".to_string(),
                first_name: "Sam".to_string(),
            }],
        }
    }
}

#[async_trait]
impl UserStore for FixedUsers {
    async fn find_by_id(&self, owner_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.known.iter().find(|u| u.id == owner_id).cloned())
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, Uuid, String)>>,
    fail: bool,
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send_alert(
        &self,
        recipient_email: &str,
        _recipient_name: &str,
        watch: &Watch,
        result: &EvaluationResult,
    ) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("broker unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient_email.to_string(), watch.id, result.message().to_string()));
        Ok(())
    }
}

/// Echoes the stored itinerary back with a fixed seat count, and serves
/// criteria searches from a canned list unless the origin is marked failing.
/// `renumbered` swaps the flight number of the echoed itinerary so the
/// refreshed record no longer matches the stored one.
struct ScriptedSource {
    seats: u32,
    search_records: Vec<AvailabilityRecord>,
    failing_origin: Option<String>,
    renumbered: Option<String>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    fn refreshing(seats: u32) -> Self {
        Self {
            seats,
            search_records: vec![],
            failing_origin: None,
            renumbered: None,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl AvailabilitySource for ScriptedSource {
    async fn search_by_criteria(
        &self,
        origin: &str,
        _destination: &str,
        _date: NaiveDate,
        _cabin_class: Option<&str>,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError> {
        *self.calls.lock().unwrap() += 1;
        if self.failing_origin.as_deref() == Some(origin) {
            return Err(AvailabilityError::Upstream("502 Bad Gateway".to_string()));
        }
        Ok(self.search_records.clone())
    }

    async fn refresh_single_itinerary(
        &self,
        snapshot: &ItinerarySnapshot,
    ) -> Result<AvailabilityRecord, AvailabilityError> {
        *self.calls.lock().unwrap() += 1;
        let mut document = snapshot.document()?;
        if let Some(number) = &self.renumbered {
            if let Some(segment) = document.pointer_mut("/itineraries/0/segments/0") {
                segment["number"] = serde_json::Value::String(number.clone());
            }
        }
        Ok(AvailabilityRecord {
            id: "refreshed".to_string(),
            bookable_seats: self.seats,
            itineraries: document["itineraries"].as_array().cloned().unwrap_or_default(),
            validating_airline_codes: Some(vec!["UA".to_string()]),
        })
    }
}

#[derive(Default)]
struct CountingPacer {
    pauses: Mutex<usize>,
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self) {
        *self.pauses.lock().unwrap() += 1;
    }
}

fn departure_in_days(days: i64) -> String {
    departure_in_hours(days * 24)
}

fn departure_in_hours(hours: i64) -> String {
    (Utc::now() + Duration::hours(hours)).format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn earlier_trigger(hours_ago: i64, seats: f64) -> TriggerRecord {
    TriggerRecord {
        triggered_at: Utc::now() - Duration::hours(hours_ago),
        message: format!("Seat availability dropped to {} seats (below threshold of 10)", seats),
        current_value: seats,
        threshold: 10.0,
    }
}

fn with_previous_trigger(mut watch: Watch, record: TriggerRecord) -> Watch {
    let alert = watch.alert.as_mut().unwrap();
    alert.last_triggered_at = Some(record.triggered_at);
    alert.trigger_history.push(record);
    watch
}

fn flight_watch(threshold: f64, origin: &str, at: &str) -> Watch {
    let raw = serde_json::json!({
        "itineraries": [{
            "segments": [{
                "carrierCode": "UA",
                "number": "100",
                "departure": { "iataCode": origin, "at": at },
                "arrival": { "iataCode": "JFK" }
            }]
        }]
    });
    Watch::single_flight("owner", format!("UA100 from {}", origin), ItinerarySnapshot::new(raw.to_string()))
        .with_alert_threshold(threshold)
}

fn search_watch(origin: &str, threshold: f64) -> Watch {
    Watch::saved_search(
        "owner",
        format!("{} to JFK", origin),
        SearchCriteria {
            origin: origin.to_string(),
            destination: "JFK".to_string(),
            departure_date: (Utc::now() + Duration::days(5)).date_naive(),
            cabin_class: Some("ECONOMY".to_string()),
            airline_filter: None,
        },
    )
    .with_alert_threshold(threshold)
}

fn plain_record(seats: u32) -> AvailabilityRecord {
    AvailabilityRecord {
        id: format!("offer-{}", seats),
        bookable_seats: seats,
        itineraries: vec![],
        validating_airline_codes: Some(vec!["UA".to_string()]),
    }
}

fn orchestrator(
    store: Arc<InMemoryWatchStore>,
    sender: Arc<RecordingSender>,
    source: Arc<ScriptedSource>,
) -> BatchOrchestrator {
    BatchOrchestrator::new(store, Arc::new(FixedUsers::owner()), sender, source).with_pacer(Arc::new(NoPacing))
}

#[tokio::test]
async fn test_same_flight_thresholds_evaluated_independently() {
    let at = departure_in_days(5);
    let high = flight_watch(10.0, "LAX", &at);
    let mid = flight_watch(5.0, "LAX", &at);
    let low = flight_watch(2.0, "LAX", &at);

    let store = Arc::new(InMemoryWatchStore::with(vec![high.clone(), mid.clone(), low.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(6));

    let summary = orchestrator(store.clone(), sender.clone(), source.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.groups, 1);
    assert_eq!(source.calls(), 1);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.triggered, 1);
    assert_eq!(summary.to_string(), "Processed 3 alerts, triggered 1 notifications");

    let sent = sender.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "traveler@example.com");
    assert_eq!(sent[0].1, high.id);
    assert_eq!(sent[0].2, "Seat availability dropped to 6 seats (below threshold of 10)");

    let saved_high = store.saved(high.id).unwrap();
    let alert = saved_high.alert.unwrap();
    assert!(alert.last_triggered_at.is_some());
    assert_eq!(alert.trigger_history.len(), 1);
    assert_eq!(alert.trigger_history[0].current_value, 6.0);
    assert_eq!(alert.trigger_history[0].threshold, 10.0);

    for quiet in [mid.id, low.id] {
        let alert = store.saved(quiet).unwrap().alert.unwrap();
        assert!(alert.last_evaluated_at.is_some());
        assert!(alert.last_triggered_at.is_none());
        assert!(alert.trigger_history.is_empty());
    }
}

#[tokio::test]
async fn test_failed_group_is_skipped_without_state_change() {
    let broken_a = search_watch("SFO", 10.0);
    let broken_b = search_watch("SFO", 40.0);
    let healthy = search_watch("LAX", 10.0);

    let store = Arc::new(InMemoryWatchStore::with(vec![broken_a.clone(), broken_b.clone(), healthy.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource {
        seats: 0,
        search_records: vec![plain_record(30)],
        failing_origin: Some("SFO".to_string()),
        renumbered: None,
        calls: Mutex::new(0),
    });

    let summary = orchestrator(store.clone(), sender.clone(), source.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.groups_skipped, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.triggered, 1);
    assert_eq!(source.calls(), 2);

    assert!(store.saved(broken_a.id).is_none());
    assert!(store.saved(broken_b.id).is_none());
    assert!(store.saved(healthy.id).is_some());
    assert_eq!(store.saved_count(), 1);
}

#[tokio::test]
async fn test_no_active_watches_is_nothing_to_do() {
    let store = Arc::new(InMemoryWatchStore::default());
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(1));

    let summary = orchestrator(store.clone(), sender, source.clone()).run().await.unwrap();

    assert!(summary.is_empty());
    assert_eq!(summary.to_string(), "No active alerts to process");
    assert_eq!(source.calls(), 0);
    assert_eq!(store.saved_count(), 0);
}

#[tokio::test]
async fn test_delivery_failure_does_not_record_trigger() {
    let watch = flight_watch(10.0, "LAX", &departure_in_days(5));
    let store = Arc::new(InMemoryWatchStore::with(vec![watch.clone()]));
    let sender = Arc::new(RecordingSender {
        fail: true,
        ..Default::default()
    });
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender, source).run().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.triggered, 0);
    assert_eq!(summary.delivery_failures, 1);

    let alert = store.saved(watch.id).unwrap().alert.unwrap();
    assert!(alert.last_evaluated_at.is_some());
    assert!(alert.last_triggered_at.is_none());
    assert!(alert.trigger_history.is_empty());
}

#[tokio::test]
async fn test_unknown_owner_is_a_delivery_failure() {
    let mut watch = flight_watch(10.0, "LAX", &departure_in_days(5));
    watch.owner_id = "someone-else".to_string();
    let store = Arc::new(InMemoryWatchStore::with(vec![watch.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender.clone(), source).run().await.unwrap();

    assert_eq!(summary.delivery_failures, 1);
    assert!(sender.sent.lock().unwrap().is_empty());
    assert!(store.saved(watch.id).unwrap().alert.unwrap().last_triggered_at.is_none());
}

#[tokio::test]
async fn test_persist_failure_does_not_stop_the_group() {
    let at = departure_in_days(5);
    let first = flight_watch(10.0, "LAX", &at);
    let second = flight_watch(10.0, "LAX", &at);

    let store = Arc::new(InMemoryWatchStore {
        active: Mutex::new(vec![first.clone(), second.clone()]),
        saved: Mutex::new(vec![]),
        reject: Some(first.id),
    });
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender, source).run().await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.persist_failures, 1);
    assert!(store.saved(first.id).is_none());
    assert!(store.saved(second.id).is_some());
}

#[tokio::test]
async fn test_recent_trigger_is_suppressed() {
    let mut watch = flight_watch(10.0, "LAX", &departure_in_days(5));
    watch.alert.as_mut().unwrap().last_triggered_at = Some(Utc::now() - Duration::hours(1));

    let store = Arc::new(InMemoryWatchStore::with(vec![watch.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender.clone(), source).run().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.triggered, 0);
    assert_eq!(summary.suppressed, 1);
    assert!(sender.sent.lock().unwrap().is_empty());
    assert!(store.saved(watch.id).unwrap().alert.unwrap().trigger_history.is_empty());
}

#[tokio::test]
async fn test_pacing_between_groups_only() {
    let at = departure_in_days(5);
    let watches = vec![
        flight_watch(1.0, "LAX", &at),
        flight_watch(1.0, "SFO", &at),
        flight_watch(1.0, "SEA", &at),
        flight_watch(1.0, "LAX", &at),
    ];
    let store = Arc::new(InMemoryWatchStore::with(watches));
    let pacer = Arc::new(CountingPacer::default());

    let summary = BatchOrchestrator::new(
        store,
        Arc::new(FixedUsers::owner()),
        Arc::new(RecordingSender::default()),
        Arc::new(ScriptedSource::refreshing(50)),
    )
    .with_pacer(pacer.clone())
    .run()
    .await
    .unwrap();

    assert_eq!(summary.groups, 3);
    assert_eq!(summary.processed, 4);
    assert_eq!(*pacer.pauses.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_unmatched_and_unreadable_flights_only_advance_evaluation() {
    let unreadable = Watch::single_flight("owner", "lost itinerary", ItinerarySnapshot::new("{}"))
        .with_alert_threshold(10.0);
    let moved = flight_watch(10.0, "LAX", &departure_in_days(5));

    let store = Arc::new(InMemoryWatchStore::with(vec![unreadable.clone(), moved.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource {
        renumbered: Some("999".to_string()),
        ..ScriptedSource::refreshing(1)
    });

    let summary = orchestrator(store.clone(), sender.clone(), source.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.groups_skipped, 0);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.triggered, 0);
    assert_eq!(source.calls(), 2);
    assert!(sender.sent.lock().unwrap().is_empty());

    for id in [unreadable.id, moved.id] {
        let alert = store.saved(id).unwrap().alert.unwrap();
        assert!(alert.last_evaluated_at.is_some());
        assert!(alert.last_triggered_at.is_none());
        assert!(alert.trigger_history.is_empty());
    }
}

#[tokio::test]
async fn test_trigger_after_cooldown_notifies_again() {
    let watch = with_previous_trigger(flight_watch(10.0, "LAX", &departure_in_days(5)), earlier_trigger(50, 4.0));

    let store = Arc::new(InMemoryWatchStore::with(vec![watch.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender.clone(), source).run().await.unwrap();

    assert_eq!(summary.triggered, 1);
    assert_eq!(summary.suppressed, 0);
    assert_eq!(sender.sent.lock().unwrap().len(), 1);

    let alert = store.saved(watch.id).unwrap().alert.unwrap();
    assert_eq!(alert.trigger_history.len(), 2);
    assert_eq!(alert.trigger_history[0].current_value, 4.0);
    assert_eq!(alert.trigger_history[1].current_value, 3.0);
    assert!(alert.last_triggered_at.unwrap() > Utc::now() - Duration::minutes(5));
}

#[tokio::test]
async fn test_imminent_departure_overrides_cooldown() {
    let watch = with_previous_trigger(flight_watch(10.0, "LAX", &departure_in_hours(2)), earlier_trigger(1, 4.0));

    let store = Arc::new(InMemoryWatchStore::with(vec![watch.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender.clone(), source).run().await.unwrap();

    assert_eq!(summary.triggered, 1);
    assert_eq!(summary.suppressed, 0);
    let sent = sender.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, watch.id);
    assert_eq!(store.saved(watch.id).unwrap().alert.unwrap().trigger_history.len(), 2);
}

#[tokio::test]
async fn test_history_limit_drops_oldest_entries() {
    let watch = with_previous_trigger(flight_watch(10.0, "LAX", &departure_in_days(5)), earlier_trigger(50, 4.0));

    let store = Arc::new(InMemoryWatchStore::with(vec![watch.clone()]));
    let sender = Arc::new(RecordingSender::default());
    let source = Arc::new(ScriptedSource::refreshing(3));

    let summary = orchestrator(store.clone(), sender, source)
        .with_history_limit(1)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.triggered, 1);
    let history = store.saved(watch.id).unwrap().alert.unwrap().trigger_history;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].current_value, 3.0);
}
