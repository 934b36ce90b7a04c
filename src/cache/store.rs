use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use super::key::{CacheKey, QueryKey};
use crate::config::CacheConfig;

/// Notifications for subscribed views.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Stored(QueryKey),
    /// The query's result was discarded; subscribers must refetch before
    /// showing it again.
    Invalidated(QueryKey),
    /// Every entry was dropped (logout).
    Cleared,
}

/// Handed out when a fetch starts; presented again to store its result.
#[derive(Debug)]
#[must_use = "a ticket must be completed with store() or abandon()"]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

struct Entry {
    value: Value,
    tags: HashSet<CacheKey>,
    stored_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    /// Bumped whenever a query is invalidated. Results of fetches begun
    /// under an older generation are not stored.
    generations: HashMap<QueryKey, u64>,
    in_flight: HashMap<QueryKey, usize>,
}

/// Shared query cache. Cloning is cheap and every clone sees the same
/// entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<CacheEvent>,
    enabled: bool,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                events,
                enabled: config.enabled,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let state = self.state();
        let entry = state.entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                tracing::debug!(query = %key, stored_at = %entry.stored_at, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::debug!(query = %key, "cached value did not decode: {}", e);
                None
            }
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.state().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.state().in_flight.get(key).copied().unwrap_or(0) > 0
    }

    /// Tags provided by the stored result of `key`.
    pub fn tags_of(&self, key: &QueryKey) -> Option<HashSet<CacheKey>> {
        self.state().entries.get(key).map(|entry| entry.tags.clone())
    }

    /// Register a fetch about to be issued for `key`.
    pub fn begin(&self, key: QueryKey) -> FetchTicket {
        let mut state = self.state();
        let generation = state.generations.get(&key).copied().unwrap_or(0);
        *state.in_flight.entry(key.clone()).or_insert(0) += 1;
        FetchTicket { key, generation }
    }

    /// Store the result of a completed fetch. Results are applied in
    /// arrival order. Returns false when the query was invalidated while
    /// the fetch was in flight, in which case nothing is stored.
    pub fn store<T: Serialize>(&self, ticket: FetchTicket, value: &T, tags: HashSet<CacheKey>) -> bool {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(query = %ticket.key, "could not cache result: {}", e);
                self.abandon(ticket);
                return false;
            }
        };

        let stored = {
            let mut state = self.state();
            release(&mut state, &ticket.key);
            let current = state.generations.get(&ticket.key).copied().unwrap_or(0);
            if !self.inner.enabled {
                false
            } else if current != ticket.generation {
                tracing::debug!(query = %ticket.key, "dropping result of a fetch invalidated in flight");
                false
            } else {
                state.entries.insert(
                    ticket.key.clone(),
                    Entry {
                        value: encoded,
                        tags,
                        stored_at: Utc::now(),
                    },
                );
                true
            }
        };

        if stored {
            self.emit(CacheEvent::Stored(ticket.key));
        }
        stored
    }

    /// Release a ticket whose fetch failed. Nothing is stored.
    pub fn abandon(&self, ticket: FetchTicket) {
        release(&mut self.state(), &ticket.key);
    }

    /// Discard every entry providing any of `keys`, and void in-flight
    /// fetches whose result could provide one. Returns the affected queries.
    pub fn invalidate(&self, keys: &HashSet<CacheKey>) -> Vec<QueryKey> {
        if keys.is_empty() {
            return Vec::new();
        }

        let affected: Vec<QueryKey> = {
            let mut state = self.state();
            let stored = state
                .entries
                .iter()
                .filter(|(_, entry)| !entry.tags.is_disjoint(keys))
                .map(|(query, _)| query.clone());
            let pending = state
                .in_flight
                .iter()
                .filter(|(query, count)| **count > 0 && keys.iter().any(|k| query.may_provide(k)))
                .map(|(query, _)| query.clone());
            let affected: HashSet<QueryKey> = stored.chain(pending).collect();

            for query in &affected {
                state.entries.remove(query);
                *state.generations.entry(query.clone()).or_insert(0) += 1;
            }
            affected.into_iter().collect()
        };

        let labels: Vec<String> = keys.iter().map(ToString::to_string).collect();
        tracing::debug!(tags = ?labels, queries = affected.len(), "invalidated cache tags");

        for query in &affected {
            self.emit(CacheEvent::Invalidated(query.clone()));
        }
        affected
    }

    /// Drop everything, including the results of fetches still in flight.
    pub fn clear(&self) {
        {
            let mut state = self.state();
            let State {
                entries,
                generations,
                in_flight,
            } = &mut *state;
            for query in entries.keys().chain(in_flight.keys()) {
                *generations.entry(query.clone()).or_insert(0) += 1;
            }
            entries.clear();
        }
        tracing::debug!("query cache cleared");
        self.emit(CacheEvent::Cleared);
    }
}

fn release(state: &mut State, key: &QueryKey) {
    if let Some(count) = state.in_flight.get_mut(key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            state.in_flight.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceKind;

    fn cache() -> QueryCache {
        QueryCache::new(&CacheConfig {
            enabled: true,
            event_capacity: 16,
        })
    }

    fn list_key() -> QueryKey {
        QueryKey::List(ResourceKind::WorkOrders)
    }

    fn list_tags(ids: &[&str]) -> HashSet<CacheKey> {
        let mut tags: HashSet<CacheKey> = ids
            .iter()
            .map(|id| CacheKey::entity(ResourceKind::WorkOrders, *id))
            .collect();
        tags.insert(CacheKey::list(ResourceKind::WorkOrders));
        tags
    }

    #[test]
    fn stores_and_returns_values() {
        let cache = cache();
        let ticket = cache.begin(list_key());
        assert!(cache.is_fetching(&list_key()));
        assert!(cache.store(ticket, &vec!["W1", "W2"], list_tags(&["W1", "W2"])));
        assert!(!cache.is_fetching(&list_key()));

        let cached: Vec<String> = cache.get(&list_key()).unwrap();
        assert_eq!(cached, vec!["W1", "W2"]);
    }

    #[test]
    fn entity_invalidation_discards_lists_containing_it() {
        let cache = cache();
        let ticket = cache.begin(list_key());
        cache.store(ticket, &vec!["W1"], list_tags(&["W1"]));
        let one = QueryKey::One(ResourceKind::WorkOrders, "W1".into());
        let ticket = cache.begin(one.clone());
        cache.store(ticket, &"W1", HashSet::from([CacheKey::entity(ResourceKind::WorkOrders, "W1")]));

        let mut events = cache.subscribe();
        let affected = cache.invalidate(&HashSet::from([CacheKey::entity(
            ResourceKind::WorkOrders,
            "W1",
        )]));

        assert_eq!(affected.len(), 2);
        assert!(cache.is_empty());
        let mut seen = vec![events.try_recv().unwrap(), events.try_recv().unwrap()];
        seen.sort_by_key(|e| format!("{:?}", e));
        assert!(seen.contains(&CacheEvent::Invalidated(list_key())));
        assert!(seen.contains(&CacheEvent::Invalidated(one)));
    }

    #[test]
    fn unrelated_tags_leave_entries_alone() {
        let cache = cache();
        let ticket = cache.begin(list_key());
        cache.store(ticket, &vec!["W1"], list_tags(&["W1"]));

        let affected = cache.invalidate(&HashSet::from([CacheKey::list(ResourceKind::Assets)]));
        assert!(affected.is_empty());
        assert!(cache.contains(&list_key()));
    }

    #[test]
    fn fetch_invalidated_in_flight_is_not_stored() {
        let cache = cache();
        let ticket = cache.begin(list_key());

        cache.invalidate(&HashSet::from([CacheKey::list(ResourceKind::WorkOrders)]));

        assert!(!cache.store(ticket, &vec!["stale"], list_tags(&[])));
        assert!(!cache.contains(&list_key()));

        // the next fetch stores normally
        let ticket = cache.begin(list_key());
        assert!(cache.store(ticket, &vec!["fresh"], list_tags(&[])));
    }

    #[test]
    fn later_arrival_overwrites_earlier() {
        let cache = cache();
        let first = cache.begin(list_key());
        let second = cache.begin(list_key());

        cache.store(second, &vec!["second"], list_tags(&[]));
        cache.store(first, &vec!["first"], list_tags(&[]));

        let cached: Vec<String> = cache.get(&list_key()).unwrap();
        assert_eq!(cached, vec!["first"]);
    }

    #[test]
    fn clear_drops_everything_and_notifies() {
        let cache = cache();
        let ticket = cache.begin(list_key());
        cache.store(ticket, &vec!["W1"], list_tags(&["W1"]));
        let pending = cache.begin(QueryKey::List(ResourceKind::Parts));
        let mut events = cache.subscribe();

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(events.try_recv().unwrap(), CacheEvent::Cleared);
        assert!(!cache.store(pending, &Vec::<String>::new(), HashSet::new()));
    }

    #[test]
    fn disabled_cache_never_stores() {
        let cache = QueryCache::new(&CacheConfig {
            enabled: false,
            event_capacity: 4,
        });
        let ticket = cache.begin(list_key());
        assert!(!cache.store(ticket, &vec!["W1"], list_tags(&["W1"])));
        assert!(!cache.is_fetching(&list_key()));
    }
}
