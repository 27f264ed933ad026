//! Telemetry event types: the loosely-typed wire record and the parsed,
//! strongly-typed event the replay core consumes.
//!
//! The wire shape keeps every payload field as raw JSON so that a single
//! mistyped field degrades that field alone instead of rejecting the whole
//! record. The parse into [`TelemetryEvent`] happens once, at ingest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::ids::TripId;

// ---------------------------------------------------------------------------
// Geographic position
// ---------------------------------------------------------------------------

/// A WGS84 position reported by a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// One event record exactly as it appears in a source file.
///
/// Every payload field is kept as raw JSON. Ingest decides per field whether
/// the value has the expected shape; a field that does not is skipped with a
/// warning while the rest of the record still applies. Only `trip_id`,
/// `timestamp` and `event_type` decide whether the record is usable at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Identifier of the trip this record belongs to.
    pub trip_id: Option<Value>,
    /// Event timestamp, RFC 3339 string or epoch milliseconds.
    pub timestamp: Option<Value>,
    /// Wire tag naming the event type.
    pub event_type: Option<Value>,
    /// Position payload, `{ "lat": .., "lng": .. }`.
    pub location: Option<Value>,
    /// Nested telemetry payload on `vehicle_telemetry` events.
    pub telemetry: Option<Value>,
    /// Odometer-style cumulative distance for the trip.
    pub distance_travelled_km: Option<Value>,
    /// Fuel level on `fuel_level_low` events.
    pub fuel_level_percent: Option<Value>,
    /// Fuel level on `refueling_completed` events.
    pub fuel_level_after_refuel: Option<Value>,
    /// Planned total distance on `trip_started` events.
    pub planned_distance_km: Option<Value>,
    /// Final distance on `trip_completed` events.
    pub total_distance_km: Option<Value>,
    /// Distance covered before a `trip_cancelled` event.
    pub distance_completed_km: Option<Value>,
}

// ---------------------------------------------------------------------------
// Parsed events
// ---------------------------------------------------------------------------

/// The kind of a telemetry event, carrying only the fields relevant to it.
///
/// The serialized tag matches the wire `event_type` string. Unrecognized
/// wire tags map to [`EventKind::Other`], which still updates the generic
/// per-trip bookkeeping (event count, last timestamp, location, distance)
/// but triggers no kind-specific transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The trip departed; carries the planned total distance when reported.
    TripStarted {
        /// Planned total distance for the trip in kilometres.
        planned_distance_km: Option<f64>,
    },
    /// The trip reached its destination.
    TripCompleted {
        /// Authoritative final distance in kilometres.
        total_distance_km: Option<f64>,
    },
    /// The trip was abandoned before completion.
    TripCancelled {
        /// Distance covered up to the cancellation in kilometres.
        distance_completed_km: Option<f64>,
    },
    /// Periodic vehicle telemetry sample.
    VehicleTelemetry {
        /// Fuel level from the nested telemetry payload, percent.
        fuel_level_percent: Option<f64>,
    },
    /// Fuel dropped below the operational threshold.
    FuelLevelLow {
        /// Fuel level at the time of the event, percent.
        fuel_level_percent: Option<f64>,
    },
    /// The vehicle refueled.
    RefuelingCompleted {
        /// Fuel level after the stop, percent.
        fuel_level_after_refuel: Option<f64>,
    },
    /// The vehicle came to a stop.
    VehicleStopped,
    /// The vehicle resumed moving.
    VehicleMoving,
    /// The vehicle exceeded the speed limit.
    SpeedViolation,
    /// Tracking signal was lost.
    SignalLost,
    /// Tracking signal was recovered.
    SignalRecovered,
    /// The tracking device battery is low.
    BatteryLow,
    /// The tracking device reported an internal error.
    DeviceError,
    /// Any wire tag the replay core does not recognize.
    Other {
        /// The unrecognized wire tag, kept for diagnostics.
        raw_type: String,
    },
}

impl EventKind {
    /// The wire tag for this kind, or the raw tag for [`EventKind::Other`].
    pub fn name(&self) -> &str {
        match self {
            Self::TripStarted { .. } => "trip_started",
            Self::TripCompleted { .. } => "trip_completed",
            Self::TripCancelled { .. } => "trip_cancelled",
            Self::VehicleTelemetry { .. } => "vehicle_telemetry",
            Self::FuelLevelLow { .. } => "fuel_level_low",
            Self::RefuelingCompleted { .. } => "refueling_completed",
            Self::VehicleStopped => "vehicle_stopped",
            Self::VehicleMoving => "vehicle_moving",
            Self::SpeedViolation => "speed_violation",
            Self::SignalLost => "signal_lost",
            Self::SignalRecovered => "signal_recovered",
            Self::BatteryLow => "battery_low",
            Self::DeviceError => "device_error",
            Self::Other { raw_type } => raw_type,
        }
    }
}

/// One fully parsed telemetry event, ready to be applied to trip state.
///
/// Immutable once built. `location` and `distance_travelled_km` apply to any
/// event kind that carries them; everything else lives on [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TelemetryEvent {
    /// The trip this event belongs to.
    pub trip_id: TripId,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Reported position, when present and well formed.
    pub location: Option<GeoPoint>,
    /// Cumulative distance travelled, when present and well formed.
    pub distance_travelled_km: Option<f64>,
    /// The specific kind of event with its own payload.
    #[serde(flatten)]
    pub kind: EventKind,
}
