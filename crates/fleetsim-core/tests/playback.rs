//! End-to-end playback behavior across the whole replay pipeline:
//! merged log ordering, monotone cursor consumption, reducer outcomes
//! visible through the engine, and full-rewind resets.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use fleetsim_core::cursor::Cursor;
use fleetsim_core::engine::SimulationEngine;
use fleetsim_core::event_log::EventLog;
use fleetsim_core::trips::TripStore;
use fleetsim_types::{RawEventRecord, SpeedMultiplier, TripAlert, TripId, TripStatus};

fn record(body: Value) -> RawEventRecord {
    serde_json::from_value(body).unwrap()
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Epoch milliseconds for a second offset, matching `ts`.
fn millis(secs: i64) -> i64 {
    secs.checked_mul(1000).unwrap()
}

#[test]
fn merged_log_is_sorted_and_stable() {
    // Two sources interleaved in time, with a timestamp tie across them.
    let source_a = vec![
        record(json!({ "trip_id": "T1", "timestamp": millis(0), "event_type": "trip_started" })),
        record(json!({ "trip_id": "T1", "timestamp": millis(20), "event_type": "vehicle_moving" })),
    ];
    let source_b = vec![
        record(json!({ "trip_id": "T2", "timestamp": millis(10), "event_type": "trip_started" })),
        record(json!({ "trip_id": "T2", "timestamp": millis(20), "event_type": "vehicle_moving" })),
    ];

    let (log, report) = EventLog::build(vec![source_a, source_b]);
    assert_eq!(report.accepted, 4);

    let timestamps: Vec<DateTime<Utc>> = log.events().iter().map(|e| e.timestamp).collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);

    // The t=20 tie keeps source order: T1's record came first.
    let tied: Vec<&str> = log
        .events()
        .iter()
        .filter(|e| e.timestamp == ts(20))
        .map(|e| e.trip_id.as_str())
        .collect();
    assert_eq!(tied, vec!["T1", "T2"]);
}

#[test]
fn advance_twice_to_same_target_is_idempotent() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({ "trip_id": "T1", "timestamp": millis(0), "event_type": "trip_started" })),
        record(json!({ "trip_id": "T1", "timestamp": millis(10), "event_type": "vehicle_stopped" })),
        record(json!({ "trip_id": "T1", "timestamp": millis(20), "event_type": "vehicle_moving" })),
    ]]);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();

    let first = cursor.advance(&log, ts(10), &mut store);
    assert_eq!(first.applied, 2);

    let second = cursor.advance(&log, ts(10), &mut store);
    assert_eq!(second.applied, 0);
    assert_eq!(second.consumed_index, first.consumed_index);
}

#[test]
fn scenario_two_sources_start_then_telemetry() {
    // Trip T1: started at t=0 with a 100 km plan in one source, a
    // telemetry sample with 50 km travelled at t=10 in another.
    let source_a = vec![record(json!({
        "trip_id": "T1",
        "timestamp": millis(0),
        "event_type": "trip_started",
        "planned_distance_km": 100.0
    }))];
    let source_b = vec![record(json!({
        "trip_id": "T1",
        "timestamp": millis(10),
        "event_type": "vehicle_telemetry",
        "telemetry": { "fuel_level_percent": 80.0 },
        "distance_travelled_km": 50.0
    }))];

    let (log, _report) = EventLog::build(vec![source_a, source_b]);
    let mut cursor = Cursor::new();
    let mut store = TripStore::new();
    let _ = cursor.advance(&log, ts(10), &mut store);

    let trip = store.get(&TripId::from("T1")).unwrap();
    assert_eq!(trip.status, TripStatus::InProgress);
    assert!((trip.distance_km - 50.0).abs() < f64::EPSILON);
    assert_eq!(trip.completion_pct, 50);
}

#[test]
fn scenario_fuel_low_then_refuel() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(0),
            "event_type": "fuel_level_low",
            "fuel_level_percent": 12.5
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(10),
            "event_type": "refueling_completed",
            "fuel_level_after_refuel": 95.0
        })),
    ]]);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();

    let _ = cursor.advance(&log, ts(0), &mut store);
    {
        let trip = store.get(&TripId::from("T1")).unwrap();
        assert_eq!(trip.fuel_level, Some(12.5));
        assert!(trip.alerts.contains(&TripAlert::FuelLow));
    }

    let _ = cursor.advance(&log, ts(10), &mut store);
    let trip = store.get(&TripId::from("T1")).unwrap();
    assert_eq!(trip.fuel_level, Some(95.0));
    assert!(trip.alerts.is_empty());
}

#[test]
fn scenario_completion_forces_full_percentage() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(0),
            "event_type": "trip_started",
            "planned_distance_km": 200.0
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(10),
            "event_type": "trip_completed",
            "total_distance_km": 120.0
        })),
    ]]);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();
    let _ = cursor.advance(&log, ts(10), &mut store);

    // 120 of 200 planned would recompute to 60, but the completing
    // event forces 100.
    let trip = store.get(&TripId::from("T1")).unwrap();
    assert_eq!(trip.status, TripStatus::Completed);
    assert!((trip.distance_km - 120.0).abs() < f64::EPSILON);
    assert_eq!(trip.completion_pct, 100);
}

#[test]
fn scenario_advancing_past_the_end_is_inert() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({ "trip_id": "T1", "timestamp": millis(0), "event_type": "trip_started" })),
        record(json!({ "trip_id": "T1", "timestamp": millis(10), "event_type": "trip_completed" })),
    ]]);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();

    let summary = cursor.advance(&log, ts(1000), &mut store);
    assert_eq!(summary.consumed_index, log.len());
    assert!(cursor.is_exhausted(&log));

    let again = cursor.advance(&log, ts(2000), &mut store);
    assert_eq!(again.applied, 0);
    assert_eq!(again.consumed_index, log.len());
}

#[test]
fn scenario_unseen_trip_id_adds_exactly_one_entry() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({ "trip_id": "T1", "timestamp": millis(0), "event_type": "trip_started" })),
        record(json!({ "trip_id": "T2", "timestamp": millis(10), "event_type": "trip_started" })),
    ]]);

    let mut engine = SimulationEngine::new(log, 5_000);
    engine.play();

    let _ = engine.tick();
    assert_eq!(engine.trips().count(), 1);

    let _ = engine.tick();
    assert_eq!(engine.trips().count(), 2);
}

#[test]
fn completion_stays_bounded_through_arbitrary_sequences() {
    // Overshoot, negative distance, cancellation, restart: the
    // percentage never leaves 0..=100.
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(0),
            "event_type": "trip_started",
            "planned_distance_km": 50.0
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(10),
            "event_type": "vehicle_telemetry",
            "distance_travelled_km": 500.0
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(20),
            "event_type": "vehicle_telemetry",
            "distance_travelled_km": -3.0
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(30),
            "event_type": "trip_cancelled",
            "distance_completed_km": 20.0
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(40),
            "event_type": "trip_started",
            "planned_distance_km": 10.0
        })),
    ]]);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();

    for secs in [0, 10, 20, 30, 40] {
        let _ = cursor.advance(&log, ts(secs), &mut store);
        let trip = store.get(&TripId::from("T1")).unwrap();
        assert!(trip.completion_pct <= 100);
    }

    let trip = store.get(&TripId::from("T1")).unwrap();
    assert_eq!(trip.status, TripStatus::InProgress);
    assert_eq!(trip.completion_pct, 100);
}

#[test]
fn repeated_stop_events_keep_one_alert() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({ "trip_id": "T1", "timestamp": millis(0), "event_type": "vehicle_stopped" })),
        record(json!({ "trip_id": "T1", "timestamp": millis(10), "event_type": "vehicle_stopped" })),
    ]]);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();
    let _ = cursor.advance(&log, ts(10), &mut store);

    let trip = store.get(&TripId::from("T1")).unwrap();
    assert_eq!(trip.alerts.len(), 1);
    assert!(trip.alerts.contains(&TripAlert::Stopped));
}

#[test]
fn reset_is_a_full_rewind_and_replay_rebuilds_identically() {
    let sources = vec![vec![
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(0),
            "event_type": "trip_started",
            "planned_distance_km": 40.0
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(30),
            "event_type": "vehicle_telemetry",
            "distance_travelled_km": 18.0
        })),
        record(json!({
            "trip_id": "T2",
            "timestamp": millis(60),
            "event_type": "trip_started"
        })),
    ]];

    let (log, _report) = EventLog::build(sources);
    let mut engine = SimulationEngine::new(log, 60_000);
    engine.play();
    let _ = engine.tick();

    let before = engine.trip(&TripId::from("T1")).cloned().unwrap();
    assert_eq!(engine.trips().count(), 2);

    engine.reset();
    let window = engine.window().unwrap();
    assert_eq!(engine.clock_time(), Some(window.start));
    assert_eq!(engine.consumed_index(), 0);
    assert_eq!(engine.trips().count(), 0);
    assert_eq!(engine.summary().total, 0);

    // A fresh pass reconstructs the same state.
    let _ = engine.tick();
    let after = engine.trip(&TripId::from("T1")).cloned().unwrap();
    assert_eq!(before, after);
}

#[test]
fn fleet_summary_tracks_the_replay() {
    let (log, _report) = EventLog::build(vec![vec![
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(0),
            "event_type": "trip_started",
            "planned_distance_km": 100.0
        })),
        record(json!({
            "trip_id": "T2",
            "timestamp": millis(10),
            "event_type": "trip_started"
        })),
        record(json!({
            "trip_id": "T1",
            "timestamp": millis(20),
            "event_type": "vehicle_telemetry",
            "distance_travelled_km": 55.5
        })),
        record(json!({
            "trip_id": "T2",
            "timestamp": millis(30),
            "event_type": "speed_violation"
        })),
        record(json!({
            "trip_id": "T2",
            "timestamp": millis(40),
            "event_type": "trip_cancelled",
            "distance_completed_km": 7.6
        })),
    ]]);

    let mut engine = SimulationEngine::new(log, 40_000);
    engine.play();
    let _ = engine.tick();

    let summary = engine.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.in_progress, 1);
    assert_eq!(summary.cancelled, 1);
    assert_eq!(summary.with_alerts, 1);
    assert_eq!(summary.past_50_pct, 1);
    assert_eq!(summary.past_80_pct, 0);
    assert!((summary.total_distance_km - 63.1).abs() < f64::EPSILON);
}

#[test]
fn malformed_fields_degrade_per_field_not_per_event() {
    let (log, report) = EventLog::build(vec![vec![record(json!({
        "trip_id": "T1",
        "timestamp": millis(0),
        "event_type": "fuel_level_low",
        "fuel_level_percent": "very low"
    }))]]);

    // The mistyped field is reported but the event still loads and the
    // alert rule still fires.
    assert_eq!(report.accepted, 1);
    assert_eq!(report.malformed_fields.len(), 1);

    let mut cursor = Cursor::new();
    let mut store = TripStore::new();
    let _ = cursor.advance(&log, ts(0), &mut store);

    let trip = store.get(&TripId::from("T1")).unwrap();
    assert_eq!(trip.fuel_level, None);
    assert!(trip.alerts.contains(&TripAlert::FuelLow));
    assert_eq!(trip.events_processed, 1);
}

#[test]
fn speed_jump_consumes_the_intervening_backlog_in_order() {
    // Events every second for 100 seconds; a 10x step of 20s per tick
    // must consume them in order without skipping.
    let records: Vec<RawEventRecord> = (0..=100)
        .map(|secs: i64| {
            record(json!({
                "trip_id": "T1",
                "timestamp": millis(secs),
                "event_type": "vehicle_telemetry",
                "distance_travelled_km": secs
            }))
        })
        .collect();

    let (log, _report) = EventLog::build(vec![records]);
    let mut engine = SimulationEngine::new(log, 2_000);
    engine.play();
    engine.set_speed(SpeedMultiplier::X10);

    let mut total_applied = 0_usize;
    while !engine.is_exhausted() {
        let report = engine.tick();
        total_applied = total_applied.saturating_add(report.applied);
    }

    assert_eq!(total_applied, 101);
    let trip = engine.trip(&TripId::from("T1")).unwrap();
    assert!((trip.distance_km - 100.0).abs() < f64::EPSILON);
    assert_eq!(trip.events_processed, 101);
}
