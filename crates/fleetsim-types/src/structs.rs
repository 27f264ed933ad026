//! Core state structs: per-trip reconstructed state, the playback window
//! and the fleet-wide summary.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{TripAlert, TripStatus};
use crate::events::GeoPoint;
use crate::ids::TripId;

// ---------------------------------------------------------------------------
// Trip state
// ---------------------------------------------------------------------------

/// The reconstructed state of one trip at the current virtual time.
///
/// Created lazily when the first event for the trip is consumed and mutated
/// only by the reducer as further events apply. `completion_pct` is always
/// within `0..=100`; `events_processed` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TripState {
    /// Identifier of the trip.
    pub trip_id: TripId,
    /// Current lifecycle status.
    pub status: TripStatus,
    /// Most recent well-formed reported position.
    pub current_location: Option<GeoPoint>,
    /// Timestamp of the most recently applied event.
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Cumulative distance travelled in kilometres.
    pub distance_km: f64,
    /// Planned total distance in kilometres, once reported.
    pub planned_distance_km: Option<f64>,
    /// Completion percentage, clamped to `0..=100`.
    pub completion_pct: u8,
    /// Most recent fuel level in percent, once reported.
    pub fuel_level: Option<f64>,
    /// Active alerts, deduplicated and ordered.
    pub alerts: BTreeSet<TripAlert>,
    /// Number of events applied to this trip so far.
    pub events_processed: u64,
}

impl TripState {
    /// Fresh state for a trip that has produced its first event.
    pub const fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            status: TripStatus::NotStarted,
            current_location: None,
            last_timestamp: None,
            distance_km: 0.0,
            planned_distance_km: None,
            completion_pct: 0,
            fuel_level: None,
            alerts: BTreeSet::new(),
            events_processed: 0,
        }
    }

    /// Whether the trip currently carries any alert.
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Playback window
// ---------------------------------------------------------------------------

/// The closed time range covered by the event log.
///
/// `start` is the timestamp of the earliest event, `end` of the latest.
/// For a single-event log the two coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlaybackWindow {
    /// Timestamp of the earliest event in the log.
    pub start: DateTime<Utc>,
    /// Timestamp of the latest event in the log.
    pub end: DateTime<Utc>,
}

impl PlaybackWindow {
    /// Clamp a candidate time into the window.
    pub fn clamp(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.max(self.start).min(self.end)
    }
}

// ---------------------------------------------------------------------------
// Fleet summary
// ---------------------------------------------------------------------------

/// Fleet-wide aggregate over every tracked trip.
///
/// Recomputed from scratch on demand; never stored incrementally.
/// `total_distance_km` is rounded to one decimal for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetSummary {
    /// Number of tracked trips.
    pub total: u32,
    /// Trips currently in progress.
    pub in_progress: u32,
    /// Trips that completed.
    pub completed: u32,
    /// Trips that were cancelled.
    pub cancelled: u32,
    /// Trips carrying at least one active alert.
    pub with_alerts: u32,
    /// Trips at or past 50 percent completion.
    pub past_50_pct: u32,
    /// Trips at or past 80 percent completion.
    pub past_80_pct: u32,
    /// Sum of distance travelled across the fleet, one-decimal rounded.
    pub total_distance_km: f64,
}
