//! Raw record parsing and the ingest error taxonomy.
//!
//! Source files are loosely typed: any payload field can be absent, null or
//! carry the wrong JSON shape. Parsing enforces exactly two levels of
//! strictness. A record without a usable trip id or timestamp cannot be
//! placed on the timeline at all and is rejected with an
//! [`InvalidEventError`]. A record whose payload field has the wrong shape
//! loses that field alone, reported as a [`MalformedFieldWarning`], while
//! the rest of the event still applies.
//!
//! Absent and null fields are normal and produce no warning. Fields that
//! are irrelevant to the record's event type are never inspected.

use chrono::{DateTime, Utc};
use serde_json::Value;

use fleetsim_types::{EventKind, GeoPoint, RawEventRecord, TelemetryEvent, TripId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A record that cannot participate in the replay at all.
///
/// Raised while the event log is built. The offending record is excluded
/// and every other record still loads; nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEventError {
    /// The record carries no timestamp.
    #[error("record {index}: missing timestamp")]
    MissingTimestamp {
        /// Position of the record in concatenated source order.
        index: usize,
    },

    /// The timestamp is present but not RFC 3339 or epoch milliseconds.
    #[error("record {index}: unparseable timestamp {found}")]
    UnparseableTimestamp {
        /// Position of the record in concatenated source order.
        index: usize,
        /// The raw value found in the timestamp field.
        found: Value,
    },

    /// The record carries no usable trip identifier.
    ///
    /// A trip id is usable when it is a non-empty JSON string.
    #[error("record {index}: missing trip id")]
    MissingTripId {
        /// Position of the record in concatenated source order.
        index: usize,
    },
}

/// A payload field that did not have the expected shape.
///
/// The field is skipped as if it were absent; every other rule for the
/// event still applies and the event still counts as processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("trip {trip_id}: field {field} on {event_type} expected {expected}, got {found}")]
pub struct MalformedFieldWarning {
    /// The trip the offending record belongs to.
    pub trip_id: TripId,
    /// The wire tag of the offending record.
    pub event_type: String,
    /// Name of the field that was skipped.
    pub field: &'static str,
    /// Shape the field was expected to have.
    pub expected: &'static str,
    /// The raw value actually found.
    pub found: Value,
}

// ---------------------------------------------------------------------------
// Record parsing
// ---------------------------------------------------------------------------

/// Outcome of successfully parsing one raw record.
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    /// The typed event, ready for the reducer.
    pub event: TelemetryEvent,
    /// Field-level issues encountered on the way.
    pub warnings: Vec<MalformedFieldWarning>,
}

/// Parse one raw record into a typed [`TelemetryEvent`].
///
/// `index` is the record's position in concatenated source order and only
/// appears in diagnostics.
///
/// # Errors
///
/// Returns [`InvalidEventError`] when the record has no usable trip id or
/// its timestamp is missing or unparseable.
pub fn parse_record(index: usize, record: &RawEventRecord) -> Result<ParsedEvent, InvalidEventError> {
    let trip_id = parse_trip_id(index, record.trip_id.as_ref())?;
    let timestamp = parse_timestamp(index, record.timestamp.as_ref())?;

    let mut warnings = Vec::new();
    let event_type = parse_event_type(&trip_id, record.event_type.as_ref(), &mut warnings);

    let fields = FieldContext {
        trip_id: &trip_id,
        event_type: &event_type,
    };

    let location = fields.location(record.location.as_ref(), &mut warnings);
    let distance_travelled_km =
        fields.number("distance_travelled_km", record.distance_travelled_km.as_ref(), &mut warnings);

    let kind = match event_type.as_str() {
        "trip_started" => EventKind::TripStarted {
            planned_distance_km: fields.number(
                "planned_distance_km",
                record.planned_distance_km.as_ref(),
                &mut warnings,
            ),
        },
        "trip_completed" => EventKind::TripCompleted {
            total_distance_km: fields.number(
                "total_distance_km",
                record.total_distance_km.as_ref(),
                &mut warnings,
            ),
        },
        "trip_cancelled" => EventKind::TripCancelled {
            distance_completed_km: fields.number(
                "distance_completed_km",
                record.distance_completed_km.as_ref(),
                &mut warnings,
            ),
        },
        "vehicle_telemetry" => EventKind::VehicleTelemetry {
            fuel_level_percent: fields.telemetry_fuel(record.telemetry.as_ref(), &mut warnings),
        },
        "fuel_level_low" => EventKind::FuelLevelLow {
            fuel_level_percent: fields.number(
                "fuel_level_percent",
                record.fuel_level_percent.as_ref(),
                &mut warnings,
            ),
        },
        "refueling_completed" => EventKind::RefuelingCompleted {
            fuel_level_after_refuel: fields.number(
                "fuel_level_after_refuel",
                record.fuel_level_after_refuel.as_ref(),
                &mut warnings,
            ),
        },
        "vehicle_stopped" => EventKind::VehicleStopped,
        "vehicle_moving" => EventKind::VehicleMoving,
        "speed_violation" => EventKind::SpeedViolation,
        "signal_lost" => EventKind::SignalLost,
        "signal_recovered" => EventKind::SignalRecovered,
        "battery_low" => EventKind::BatteryLow,
        "device_error" => EventKind::DeviceError,
        other => EventKind::Other {
            raw_type: other.to_owned(),
        },
    };

    Ok(ParsedEvent {
        event: TelemetryEvent {
            trip_id,
            timestamp,
            location,
            distance_travelled_km,
            kind,
        },
        warnings,
    })
}

fn parse_trip_id(index: usize, value: Option<&Value>) -> Result<TripId, InvalidEventError> {
    match value {
        Some(Value::String(id)) if !id.is_empty() => Ok(TripId::from(id.as_str())),
        _ => Err(InvalidEventError::MissingTripId { index }),
    }
}

fn parse_timestamp(index: usize, value: Option<&Value>) -> Result<DateTime<Utc>, InvalidEventError> {
    let found = match value {
        None | Some(Value::Null) => return Err(InvalidEventError::MissingTimestamp { index }),
        Some(found) => found,
    };
    match found {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| InvalidEventError::UnparseableTimestamp {
                index,
                found: found.clone(),
            }),
        Value::Number(millis) => millis
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| InvalidEventError::UnparseableTimestamp {
                index,
                found: found.clone(),
            }),
        _ => Err(InvalidEventError::UnparseableTimestamp {
            index,
            found: found.clone(),
        }),
    }
}

/// Read the wire tag. A missing tag is tolerated (the generic rules still
/// apply to the record); a present non-string tag additionally warns.
fn parse_event_type(
    trip_id: &TripId,
    value: Option<&Value>,
    warnings: &mut Vec<MalformedFieldWarning>,
) -> String {
    match value {
        Some(Value::String(tag)) => tag.clone(),
        None | Some(Value::Null) => String::new(),
        Some(found) => {
            warnings.push(MalformedFieldWarning {
                trip_id: trip_id.clone(),
                event_type: String::new(),
                field: "event_type",
                expected: "a string",
                found: found.clone(),
            });
            String::new()
        }
    }
}

/// Shared context for coercing payload fields on one record.
struct FieldContext<'a> {
    trip_id: &'a TripId,
    event_type: &'a str,
}

impl FieldContext<'_> {
    fn warn(
        &self,
        field: &'static str,
        expected: &'static str,
        found: &Value,
        warnings: &mut Vec<MalformedFieldWarning>,
    ) {
        warnings.push(MalformedFieldWarning {
            trip_id: self.trip_id.clone(),
            event_type: self.event_type.to_owned(),
            field,
            expected,
            found: found.clone(),
        });
    }

    /// Coerce a numeric field. Absent and null are silently `None`.
    fn number(
        &self,
        field: &'static str,
        value: Option<&Value>,
        warnings: &mut Vec<MalformedFieldWarning>,
    ) -> Option<f64> {
        let found = match value {
            None | Some(Value::Null) => return None,
            Some(found) => found,
        };
        match found.as_f64() {
            Some(number) => Some(number),
            None => {
                self.warn(field, "a number", found, warnings);
                None
            }
        }
    }

    /// Coerce a `{ lat, lng }` position payload.
    fn location(
        &self,
        value: Option<&Value>,
        warnings: &mut Vec<MalformedFieldWarning>,
    ) -> Option<GeoPoint> {
        let found = match value {
            None | Some(Value::Null) => return None,
            Some(found) => found,
        };
        let point = found.as_object().and_then(|fields| {
            let lat = fields.get("lat").and_then(Value::as_f64)?;
            let lng = fields.get("lng").and_then(Value::as_f64)?;
            Some(GeoPoint { lat, lng })
        });
        if point.is_none() {
            self.warn(
                "location",
                "an object with numeric lat and lng",
                found,
                warnings,
            );
        }
        point
    }

    /// Coerce the nested telemetry payload down to its fuel level.
    ///
    /// The payload must be an object; a well-formed payload without a fuel
    /// reading is silently `None`.
    fn telemetry_fuel(
        &self,
        value: Option<&Value>,
        warnings: &mut Vec<MalformedFieldWarning>,
    ) -> Option<f64> {
        let found = match value {
            None | Some(Value::Null) => return None,
            Some(found) => found,
        };
        let Some(payload) = found.as_object() else {
            self.warn("telemetry", "an object", found, warnings);
            return None;
        };
        self.number(
            "telemetry.fuel_level_percent",
            payload.get("fuel_level_percent"),
            warnings,
        )
    }
}
