//! Enumeration types for the Fleetsim replay engine.
//!
//! Trip lifecycle status, the closed set of dashboard alerts, and the
//! playback speed multiplier.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Trip status
// ---------------------------------------------------------------------------

/// Lifecycle status of a tracked trip.
///
/// Every trip starts as [`TripStatus::NotStarted`] and moves through the
/// lifecycle purely as a function of the events applied to it. No ordering
/// validation is performed: a later lifecycle event always wins, whatever
/// state the trip was in before.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// No lifecycle event has been seen yet.
    #[default]
    NotStarted,
    /// A `trip_started` event has been applied.
    InProgress,
    /// A `trip_completed` event has been applied.
    Completed,
    /// A `trip_cancelled` event has been applied.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// An active alert attached to a trip.
///
/// Alerts are set-valued on the trip: adding one that is already present or
/// removing one that is absent is a no-op. The serialized form uses the
/// human-readable labels the dashboard renders directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TripAlert {
    /// Raised by `fuel_level_low`, cleared by `refueling_completed`.
    #[serde(rename = "Fuel low")]
    FuelLow,
    /// Raised by `vehicle_stopped`, cleared by `vehicle_moving`.
    #[serde(rename = "Stopped")]
    Stopped,
    /// Raised by `speed_violation`. Never cleared.
    #[serde(rename = "Overspeed")]
    Overspeed,
    /// Raised by `signal_lost`, cleared by `signal_recovered`.
    #[serde(rename = "Signal lost")]
    SignalLost,
    /// Raised by `battery_low`. Never cleared.
    #[serde(rename = "Device battery low")]
    DeviceBatteryLow,
    /// Raised by `device_error`. Never cleared.
    #[serde(rename = "Device error")]
    DeviceError,
}

impl TripAlert {
    /// Human-readable label, identical to the serialized form.
    pub const fn label(self) -> &'static str {
        match self {
            Self::FuelLow => "Fuel low",
            Self::Stopped => "Stopped",
            Self::Overspeed => "Overspeed",
            Self::SignalLost => "Signal lost",
            Self::DeviceBatteryLow => "Device battery low",
            Self::DeviceError => "Device error",
        }
    }
}

impl core::fmt::Display for TripAlert {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Playback speed
// ---------------------------------------------------------------------------

/// Playback speed multiplier.
///
/// The multiplier scales how much simulated time passes per tick. It never
/// changes the real-time tick cadence. Only the three factors the playback
/// surface offers are representable; arbitrary factors are rejected at the
/// boundary via [`SpeedMultiplier::from_factor`].
///
/// Serializes as the bare factor (`1`, `5` or `10`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub enum SpeedMultiplier {
    /// Real-time pacing.
    #[default]
    X1,
    /// Five times real-time.
    X5,
    /// Ten times real-time.
    X10,
}

impl SpeedMultiplier {
    /// The numeric factor applied to the simulated step per tick.
    pub const fn factor(self) -> u64 {
        match self {
            Self::X1 => 1,
            Self::X5 => 5,
            Self::X10 => 10,
        }
    }

    /// Parse a raw factor, returning `None` for unsupported values.
    pub const fn from_factor(factor: u64) -> Option<Self> {
        match factor {
            1 => Some(Self::X1),
            5 => Some(Self::X5),
            10 => Some(Self::X10),
            _ => None,
        }
    }
}

impl TryFrom<u64> for SpeedMultiplier {
    type Error = String;

    fn try_from(factor: u64) -> Result<Self, Self::Error> {
        Self::from_factor(factor)
            .ok_or_else(|| format!("unsupported speed factor {factor}, expected 1, 5 or 10"))
    }
}

impl From<SpeedMultiplier> for u64 {
    fn from(speed: SpeedMultiplier) -> Self {
        speed.factor()
    }
}

impl core::fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x", self.factor())
    }
}
