//! The per-trip state transition function.
//!
//! One event goes in, one trip state is mutated in place. The function is
//! pure in every other sense: no clocks, no stores, no other trips. Replay
//! determinism rests on this, so the same events in the same order always
//! rebuild the same state.
//!
//! Lifecycle transitions are last-writer-wins. Nothing checks that a trip
//! started before it completed; whatever event comes later on the timeline
//! decides the status.

use fleetsim_types::{EventKind, TelemetryEvent, TripAlert, TripState, TripStatus};

/// Apply one event to one trip's state.
///
/// # Order of operations
///
/// 1. Count the event and move the trip's last-seen timestamp
/// 2. Take over a well-formed reported position
/// 3. Take over a reported cumulative distance
/// 4. Kind-specific transition (fuel, lifecycle, alerts)
/// 5. Recompute the completion percentage from distance and plan
///
/// Step 5 runs for every event except `trip_completed`: completion forces
/// to 100 there and the forced value stands for that event. Any later
/// event on the trip recomputes normally again.
pub fn apply(state: &mut TripState, event: &TelemetryEvent) {
    // 1. Generic bookkeeping, for every kind including unrecognized ones.
    state.events_processed = state.events_processed.saturating_add(1);
    state.last_timestamp = Some(event.timestamp);

    // 2. Position.
    if let Some(location) = event.location {
        state.current_location = Some(location);
    }

    // 3. Cumulative distance.
    if let Some(distance) = event.distance_travelled_km {
        state.distance_km = distance;
    }

    // 4. Kind-specific transition.
    match &event.kind {
        EventKind::VehicleTelemetry { fuel_level_percent } => {
            if let Some(fuel) = *fuel_level_percent {
                state.fuel_level = Some(fuel);
            }
        }
        EventKind::FuelLevelLow { fuel_level_percent } => {
            if let Some(fuel) = *fuel_level_percent {
                state.fuel_level = Some(fuel);
            }
            state.alerts.insert(TripAlert::FuelLow);
        }
        EventKind::RefuelingCompleted {
            fuel_level_after_refuel,
        } => {
            if let Some(fuel) = *fuel_level_after_refuel {
                state.fuel_level = Some(fuel);
            }
            state.alerts.remove(&TripAlert::FuelLow);
        }
        EventKind::TripStarted {
            planned_distance_km,
        } => {
            state.status = TripStatus::InProgress;
            if let Some(planned) = *planned_distance_km {
                state.planned_distance_km = Some(planned);
            }
        }
        EventKind::TripCompleted { total_distance_km } => {
            state.status = TripStatus::Completed;
            if let Some(total) = *total_distance_km {
                state.distance_km = total;
            }
            state.completion_pct = 100;
        }
        EventKind::TripCancelled {
            distance_completed_km,
        } => {
            state.status = TripStatus::Cancelled;
            if let Some(covered) = *distance_completed_km {
                state.distance_km = covered;
            }
        }
        EventKind::VehicleStopped => {
            state.alerts.insert(TripAlert::Stopped);
        }
        EventKind::VehicleMoving => {
            state.alerts.remove(&TripAlert::Stopped);
        }
        EventKind::SpeedViolation => {
            state.alerts.insert(TripAlert::Overspeed);
        }
        EventKind::SignalLost => {
            state.alerts.insert(TripAlert::SignalLost);
        }
        EventKind::SignalRecovered => {
            state.alerts.remove(&TripAlert::SignalLost);
        }
        EventKind::BatteryLow => {
            state.alerts.insert(TripAlert::DeviceBatteryLow);
        }
        EventKind::DeviceError => {
            state.alerts.insert(TripAlert::DeviceError);
        }
        EventKind::Other { .. } => {}
    }

    // 5. Completion, except on the completing event itself.
    if !matches!(event.kind, EventKind::TripCompleted { .. }) {
        recompute_completion(state);
    }
}

/// Derive the completion percentage from distance and planned distance.
///
/// Without a positive planned distance the percentage is left untouched.
fn recompute_completion(state: &mut TripState) {
    let Some(planned) = state.planned_distance_km else {
        return;
    };
    if planned <= 0.0 {
        return;
    }
    state.completion_pct = as_pct((state.distance_km / planned) * 100.0);
}

/// Clamp to `0..=100` and round to the nearest whole percent.
///
/// The clamp keeps the value inside u8 range before the cast.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_pct(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}
