//! The playback engine owning all simulation state.
//!
//! One engine owns the event log, the virtual clock, the cursor, the trip
//! store and the trip selection, and is the only way to mutate any of
//! them. Every mutation goes through `&mut self`, so ticks can never
//! overlap or interleave; pausing takes effect between ticks, never in the
//! middle of one.
//!
//! An engine built from an empty log has no clock. All controls degrade to
//! no-ops and all queries return empty results in that case.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use fleetsim_types::{FleetSummary, PlaybackWindow, SpeedMultiplier, TripId, TripState};

use crate::clock::VirtualClock;
use crate::cursor::{AdvanceSummary, Cursor};
use crate::event_log::EventLog;
use crate::summary;
use crate::trips::TripStore;

/// What one engine tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Virtual time after the tick, `None` for an engine without events.
    pub time: Option<DateTime<Utc>>,
    /// Whether the clock moved this tick.
    pub advanced: bool,
    /// Events applied this tick.
    pub applied: usize,
    /// Trips that received events this tick.
    pub touched: BTreeSet<TripId>,
    /// Consumption index after the tick.
    pub consumed_index: usize,
}

/// Replay engine for one event log.
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    log: EventLog,
    clock: Option<VirtualClock>,
    cursor: Cursor,
    trips: TripStore,
    selected: Option<TripId>,
}

impl SimulationEngine {
    /// Build an engine over a log.
    ///
    /// `step_ms` is the simulated duration covered by one tick at 1x
    /// speed. The clock starts paused at the window start; nothing is
    /// consumed until the first playing tick.
    pub fn new(log: EventLog, step_ms: u64) -> Self {
        let clock = log
            .window()
            .map(|window| VirtualClock::new(window, step_ms));
        if clock.is_none() {
            info!("Engine built over an empty log; playback disabled");
        }
        Self {
            log,
            clock,
            cursor: Cursor::new(),
            trips: TripStore::new(),
            selected: None,
        }
    }

    // -----------------------------------------------------------------
    // Control surface
    // -----------------------------------------------------------------

    /// Start advancing on subsequent ticks. Idempotent.
    pub fn play(&mut self) {
        if let Some(clock) = self.clock.as_mut()
            && !clock.is_playing()
        {
            clock.play();
            debug!(time = %clock.time(), "Playback started");
        }
    }

    /// Stop advancing on subsequent ticks, keeping position. Idempotent.
    pub fn pause(&mut self) {
        if let Some(clock) = self.clock.as_mut()
            && clock.is_playing()
        {
            clock.pause();
            debug!(time = %clock.time(), "Playback paused");
        }
    }

    /// Change the speed multiplier, effective from the next tick.
    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        if let Some(clock) = self.clock.as_mut()
            && clock.speed() != speed
        {
            clock.set_speed(speed);
            debug!(%speed, "Playback speed changed");
        }
    }

    /// Rewind to the window start and forget every reconstructed trip.
    ///
    /// The playing flag and speed survive a reset. Nothing is re-applied
    /// here: the store stays empty until the next playing tick replays
    /// events from the log start.
    pub fn reset(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            let time = clock.reset();
            self.cursor.reset(&mut self.trips);
            self.selected = None;
            info!(time = %time, "Playback reset");
        }
    }

    /// Change which trip is selected. Pure bookkeeping.
    pub fn select_trip(&mut self, trip_id: Option<TripId>) {
        if self.selected != trip_id {
            debug!(selected = ?trip_id, "Trip selection changed");
            self.selected = trip_id;
        }
    }

    // -----------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------

    /// Run one full tick: move the clock, then consume up to the new time.
    pub fn tick(&mut self) -> TickReport {
        let moved = self.advance_clock();
        let summary = match moved {
            Some(target) => {
                let (summary, _more) = self.apply_up_to(target, usize::MAX);
                summary
            }
            None => AdvanceSummary {
                consumed_index: self.cursor.consumed_index(),
                ..AdvanceSummary::default()
            },
        };

        TickReport {
            time: self.clock_time(),
            advanced: moved.is_some(),
            applied: summary.applied,
            touched: summary.touched,
            consumed_index: summary.consumed_index,
        }
    }

    /// Move the clock one step, returning the new time if it moved.
    ///
    /// Exposed separately from [`SimulationEngine::tick`] so a driver can
    /// consume the resulting backlog in bounded chunks.
    pub fn advance_clock(&mut self) -> Option<DateTime<Utc>> {
        self.clock.as_mut()?.tick()
    }

    /// Consume at most `max_events` pending events up to `target`.
    ///
    /// Returns what was applied plus a flag that is true while eligible
    /// events remain. Auto-selects the first seen trip once events start
    /// flowing and nothing is selected yet.
    pub fn apply_up_to(
        &mut self,
        target: DateTime<Utc>,
        max_events: usize,
    ) -> (AdvanceSummary, bool) {
        let (summary, more) = self
            .cursor
            .advance_bounded(&self.log, target, &mut self.trips, max_events);
        if self.selected.is_none()
            && let Some(first) = self.trips.first_seen()
        {
            let first = first.clone();
            debug!(selected = %first, "Auto-selected first trip");
            self.selected = Some(first);
        }
        (summary, more)
    }

    // -----------------------------------------------------------------
    // Query surface
    // -----------------------------------------------------------------

    /// The time range covered by the log, `None` when it is empty.
    pub fn window(&self) -> Option<PlaybackWindow> {
        self.log.window()
    }

    /// Current virtual time, `None` for an engine without events.
    pub fn clock_time(&self) -> Option<DateTime<Utc>> {
        self.clock.as_ref().map(VirtualClock::time)
    }

    /// Whether ticks currently advance the clock.
    pub fn is_playing(&self) -> bool {
        self.clock.as_ref().is_some_and(VirtualClock::is_playing)
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> SpeedMultiplier {
        self.clock
            .as_ref()
            .map_or_else(SpeedMultiplier::default, VirtualClock::speed)
    }

    /// Trip states in the order the trips first appeared.
    pub fn trips(&self) -> impl Iterator<Item = &TripState> {
        self.trips.iter_first_seen()
    }

    /// State of one trip, if it has been seen.
    pub fn trip(&self, trip_id: &TripId) -> Option<&TripState> {
        self.trips.get(trip_id)
    }

    /// Id of the selected trip, if any.
    pub const fn selected_trip_id(&self) -> Option<&TripId> {
        self.selected.as_ref()
    }

    /// State of the selected trip, if it is selected and has been seen.
    pub fn selected_trip(&self) -> Option<&TripState> {
        self.selected.as_ref().and_then(|id| self.trips.get(id))
    }

    /// Fleet summary over every reconstructed trip, computed on demand.
    pub fn summary(&self) -> FleetSummary {
        summary::summarize(self.trips.values())
    }

    /// Total number of events in the log.
    pub const fn events_total(&self) -> usize {
        self.log.len()
    }

    /// Index of the first event not yet consumed.
    pub const fn consumed_index(&self) -> usize {
        self.cursor.consumed_index()
    }

    /// Whether every event in the log has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted(&self.log)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use fleetsim_types::{RawEventRecord, TripStatus};

    use super::*;

    fn record(trip_id: &str, secs: i64, event_type: &str) -> RawEventRecord {
        serde_json::from_value(json!({
            "trip_id": trip_id,
            "timestamp": secs.checked_mul(1000).unwrap(),
            "event_type": event_type,
        }))
        .unwrap()
    }

    /// Two trips over a 40 second window, one event every 10 seconds.
    fn sample_engine(step_ms: u64) -> SimulationEngine {
        let (log, report) = EventLog::build(vec![vec![
            record("TRIP-A", 0, "trip_started"),
            record("TRIP-B", 10, "trip_started"),
            record("TRIP-A", 20, "vehicle_stopped"),
            record("TRIP-B", 30, "vehicle_moving"),
            record("TRIP-A", 40, "trip_completed"),
        ]]);
        assert!(report.rejected.is_empty());
        SimulationEngine::new(log, step_ms)
    }

    #[test]
    fn starts_paused_with_nothing_consumed() {
        let engine = sample_engine(10_000);
        assert!(!engine.is_playing());
        assert_eq!(engine.consumed_index(), 0);
        assert_eq!(engine.trips().count(), 0);
        assert_eq!(engine.summary().total, 0);
        let window = engine.window().unwrap();
        assert_eq!(engine.clock_time(), Some(window.start));
    }

    #[test]
    fn paused_ticks_do_nothing() {
        let mut engine = sample_engine(10_000);
        let report = engine.tick();
        assert!(!report.advanced);
        assert_eq!(report.applied, 0);
        assert_eq!(engine.trips().count(), 0);
    }

    #[test]
    fn playing_tick_consumes_and_autoselects() {
        let mut engine = sample_engine(10_000);
        engine.play();

        // First tick moves to t=10 and applies the events at 0 and 10.
        let report = engine.tick();
        assert!(report.advanced);
        assert_eq!(report.applied, 2);
        assert_eq!(report.consumed_index, 2);
        assert_eq!(engine.trips().count(), 2);

        // The first trip on the timeline became the selection.
        assert_eq!(engine.selected_trip_id(), Some(&TripId::from("TRIP-A")));
        assert_eq!(
            engine.selected_trip().map(|t| t.status),
            Some(TripStatus::InProgress)
        );
    }

    #[test]
    fn manual_selection_is_not_overridden() {
        let mut engine = sample_engine(10_000);
        engine.select_trip(Some(TripId::from("TRIP-B")));
        engine.play();
        let _ = engine.tick();
        assert_eq!(engine.selected_trip_id(), Some(&TripId::from("TRIP-B")));
    }

    #[test]
    fn runs_to_exhaustion_and_pins_at_end() {
        let mut engine = sample_engine(10_000);
        engine.play();
        engine.set_speed(SpeedMultiplier::X5);

        // One 50s step covers the whole 40s window, clamped to the end.
        let report = engine.tick();
        let window = engine.window().unwrap();
        assert_eq!(report.time, Some(window.end));
        assert_eq!(report.applied, 5);
        assert!(engine.is_exhausted());

        // Pinned at the end: further ticks are inert, still playing.
        let report = engine.tick();
        assert!(!report.advanced);
        assert_eq!(report.applied, 0);
        assert_eq!(report.consumed_index, 5);
        assert!(engine.is_playing());
        let trip_a = engine.trip(&TripId::from("TRIP-A")).unwrap();
        assert_eq!(trip_a.status, TripStatus::Completed);
    }

    #[test]
    fn reset_is_a_full_rewind() {
        let mut engine = sample_engine(10_000);
        engine.play();
        engine.set_speed(SpeedMultiplier::X10);
        let _ = engine.tick();
        assert!(engine.is_exhausted());
        assert!(engine.selected_trip_id().is_some());

        engine.reset();
        let window = engine.window().unwrap();
        assert_eq!(engine.clock_time(), Some(window.start));
        assert_eq!(engine.consumed_index(), 0);
        assert_eq!(engine.trips().count(), 0);
        assert_eq!(engine.selected_trip_id(), None);
        assert_eq!(engine.summary().total, 0);
        // Playing flag survives the rewind.
        assert!(engine.is_playing());

        // The next tick replays from the start as a fresh pass.
        let report = engine.tick();
        assert!(report.advanced);
        assert_eq!(report.applied, 5);
        assert_eq!(engine.trips().count(), 2);
    }

    #[test]
    fn empty_engine_degrades_gracefully() {
        let (log, _report) = EventLog::build(vec![]);
        let mut engine = SimulationEngine::new(log, 1000);

        assert!(engine.window().is_none());
        assert_eq!(engine.clock_time(), None);
        assert!(!engine.is_playing());

        engine.play();
        assert!(!engine.is_playing());

        let report = engine.tick();
        assert!(!report.advanced);
        assert_eq!(report.applied, 0);
        assert_eq!(report.time, None);

        engine.reset();
        engine.set_speed(SpeedMultiplier::X10);
        assert_eq!(engine.speed(), SpeedMultiplier::X1);
        assert_eq!(engine.trips().count(), 0);
    }
}
