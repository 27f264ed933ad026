//! Monotone consumption of the event log.
//!
//! The cursor is the boundary between replayed and pending events. It only
//! ever moves forward through the log; moving the virtual clock backwards
//! in time is expressed as a reset followed by a fresh forward replay,
//! never as un-applying events.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use fleetsim_types::TripId;

use crate::event_log::EventLog;
use crate::reducer;
use crate::trips::TripStore;

/// What one advance over the log did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceSummary {
    /// Index of the first event still pending after the advance.
    pub consumed_index: usize,
    /// Number of events applied by this advance.
    pub applied: usize,
    /// Trips that received at least one event in this advance.
    pub touched: BTreeSet<TripId>,
}

/// Consumption index over an [`EventLog`].
///
/// Advancing twice to the same target applies nothing the second time; an
/// event is applied exactly once per replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    consumed: usize,
}

impl Cursor {
    /// A cursor at the start of the log.
    pub const fn new() -> Self {
        Self { consumed: 0 }
    }

    /// Index of the next event to consume.
    pub const fn consumed_index(&self) -> usize {
        self.consumed
    }

    /// Whether every event in the log has been consumed.
    pub fn is_exhausted(&self, log: &EventLog) -> bool {
        self.consumed >= log.len()
    }

    /// Apply every pending event with `timestamp <= target`, in log order.
    pub fn advance(
        &mut self,
        log: &EventLog,
        target: DateTime<Utc>,
        store: &mut TripStore,
    ) -> AdvanceSummary {
        let (summary, _more) = self.advance_bounded(log, target, store, usize::MAX);
        summary
    }

    /// Apply at most `max_events` pending events with `timestamp <= target`.
    ///
    /// Returns the summary plus a flag that is true while eligible events
    /// remain, letting callers break a large catch-up into chunks without
    /// ever applying an event twice or out of order.
    pub fn advance_bounded(
        &mut self,
        log: &EventLog,
        target: DateTime<Utc>,
        store: &mut TripStore,
        max_events: usize,
    ) -> (AdvanceSummary, bool) {
        let mut summary = AdvanceSummary::default();

        while summary.applied < max_events {
            let Some(event) = log.get(self.consumed) else {
                break;
            };
            if event.timestamp > target {
                break;
            }
            reducer::apply(store.get_or_create(&event.trip_id), event);
            summary.touched.insert(event.trip_id.clone());
            summary.applied = summary.applied.saturating_add(1);
            self.consumed = self.consumed.saturating_add(1);
        }

        summary.consumed_index = self.consumed;
        let more = log
            .get(self.consumed)
            .is_some_and(|event| event.timestamp <= target);
        (summary, more)
    }

    /// Rewind to the log start and wipe the store for a fresh replay.
    pub fn reset(&mut self, store: &mut TripStore) {
        self.consumed = 0;
        store.clear();
    }
}
