//! Shared type definitions for the Fleetsim replay engine.
//!
//! This crate is the single source of truth for all types used across the
//! Fleetsim workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the fleet dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrapper for trip identifiers
//! - [`enums`] -- Enumeration types (status, alerts, playback speed)
//! - [`events`] -- Wire-shaped raw records and parsed telemetry events
//! - [`structs`] -- Core state structs (trip state, window, fleet summary)

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{SpeedMultiplier, TripAlert, TripStatus};
pub use events::{EventKind, GeoPoint, RawEventRecord, TelemetryEvent};
pub use ids::TripId;
pub use structs::{FleetSummary, PlaybackWindow, TripState};
