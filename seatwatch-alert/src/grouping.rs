use std::collections::HashMap;

use seatwatch_core::{Watch, WatchKind};
use tracing::warn;

const KEY_SEPARATOR: &str = "|";

/// Watches that can be served by a single upstream fetch.
#[derive(Debug, Clone)]
pub struct WatchGroup {
    pub key: String,
    pub watches: Vec<Watch>,
}

impl WatchGroup {
    /// The watch whose criteria drive the fetch for the whole group.
    pub fn representative(&self) -> Option<&Watch> {
        self.watches.first()
    }
}

/// Derives fetch-group keys.
///
/// Saved searches key on origin, destination, date and cabin. The airline
/// filter is applied after the fetch, so it stays out of the key. Single
/// flights key on route and date taken from the stored itinerary; a snapshot
/// that cannot be read gets a key of its own so the watch is still evaluated.
#[derive(Debug, Clone, Default)]
pub struct GroupKeyBuilder;

impl GroupKeyBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn key(&self, watch: &Watch) -> String {
        match &watch.kind {
            WatchKind::SavedSearch(criteria) => {
                let date = criteria.departure_date.format("%Y-%m-%d").to_string();
                [
                    criteria.origin.as_str(),
                    criteria.destination.as_str(),
                    date.as_str(),
                    criteria.cabin_class.as_deref().unwrap_or(""),
                ]
                .join(KEY_SEPARATOR)
            }
            WatchKind::SingleFlight { snapshot } => match snapshot.route_key() {
                Ok(route) => [
                    route.origin.as_str(),
                    route.final_destination.as_str(),
                    route.departure_date.as_str(),
                ]
                .join(KEY_SEPARATOR),
                Err(e) => {
                    warn!("Could not derive group key for watch {}: {}", watch.id, e);
                    format!("watch{}{}", KEY_SEPARATOR, watch.id)
                }
            },
        }
    }

    /// Groups watches by key. Groups come out in order of first appearance and
    /// keep their members in input order.
    pub fn group(&self, watches: Vec<Watch>) -> Vec<WatchGroup> {
        let mut groups: Vec<WatchGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for watch in watches {
            let key = self.key(&watch);
            match index.get(&key) {
                Some(&slot) => groups[slot].watches.push(watch),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(WatchGroup {
                        key,
                        watches: vec![watch],
                    });
                }
            }
        }

        groups
    }
}
