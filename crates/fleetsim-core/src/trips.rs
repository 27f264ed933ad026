//! The collection of reconstructed trip states.
//!
//! Trips are created lazily: a state exists only once the first event for
//! its id has been consumed. The store remembers the order in which trips
//! first appeared, and listing walks that order so the trip list stays
//! stable while playback adds more trips behind it.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use fleetsim_types::{TripId, TripState};

/// All trip states reconstructed so far, in both id and first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TripStore {
    /// Reconstructed state per trip id.
    states: BTreeMap<TripId, TripState>,

    /// Trip ids in the order their first event was consumed.
    order: Vec<TripId>,
}

impl TripStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            states: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Mutable state for a trip, created fresh on first sight.
    pub fn get_or_create(&mut self, trip_id: &TripId) -> &mut TripState {
        match self.states.entry(trip_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push(trip_id.clone());
                entry.insert(TripState::new(trip_id.clone()))
            }
        }
    }

    /// State for a trip, if it has been seen.
    pub fn get(&self, trip_id: &TripId) -> Option<&TripState> {
        self.states.get(trip_id)
    }

    /// Whether the trip has been seen.
    pub fn contains(&self, trip_id: &TripId) -> bool {
        self.states.contains_key(trip_id)
    }

    /// States in the order the trips first appeared.
    pub fn iter_first_seen(&self) -> impl Iterator<Item = &TripState> {
        self.order.iter().filter_map(|id| self.states.get(id))
    }

    /// Id of the trip that appeared first, if any.
    pub fn first_seen(&self) -> Option<&TripId> {
        self.order.first()
    }

    /// States in trip id order.
    pub fn values(&self) -> impl Iterator<Item = &TripState> {
        self.states.values()
    }

    /// Number of trips seen so far.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no trip has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget every trip, including the first-seen ordering.
    pub fn clear(&mut self) {
        self.states.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_state_on_first_sight() {
        let mut store = TripStore::new();
        assert!(store.is_empty());

        let id = TripId::from("TRIP-B");
        let state = store.get_or_create(&id);
        assert_eq!(state.trip_id, id);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&id));

        // Second lookup reuses the same state.
        store.get_or_create(&id).events_processed = 5;
        assert_eq!(store.get(&id).map(|s| s.events_processed), Some(5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn listing_keeps_first_seen_order() {
        let mut store = TripStore::new();
        // Insertion order deliberately disagrees with id order.
        let _ = store.get_or_create(&TripId::from("TRIP-C"));
        let _ = store.get_or_create(&TripId::from("TRIP-A"));
        let _ = store.get_or_create(&TripId::from("TRIP-B"));
        let _ = store.get_or_create(&TripId::from("TRIP-A"));

        let listed: Vec<&str> = store
            .iter_first_seen()
            .map(|state| state.trip_id.as_str())
            .collect();
        assert_eq!(listed, vec!["TRIP-C", "TRIP-A", "TRIP-B"]);
        assert_eq!(store.first_seen(), Some(&TripId::from("TRIP-C")));
    }

    #[test]
    fn clear_forgets_states_and_order() {
        let mut store = TripStore::new();
        let _ = store.get_or_create(&TripId::from("TRIP-A"));
        let _ = store.get_or_create(&TripId::from("TRIP-B"));

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.first_seen(), None);
        assert_eq!(store.iter_first_seen().count(), 0);
    }
}
