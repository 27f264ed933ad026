//! Event-sourced replay core for the Fleetsim telemetry player.
//!
//! This crate owns the whole simulation pipeline: ingesting raw event
//! records into an ordered log, moving a virtual clock under playback
//! control, consuming the log monotonically through a cursor, reducing
//! events into per-trip state and aggregating the fleet summary.
//!
//! # Modules
//!
//! - [`ingest`] -- Raw record parsing and the ingest error taxonomy.
//! - [`event_log`] -- The merged, stable-sorted, immutable event log.
//! - [`clock`] -- Virtual clock with play/pause and speed multiplier.
//! - [`reducer`] -- Pure per-trip state transition function.
//! - [`trips`] -- Trip state collection with first-seen ordering.
//! - [`cursor`] -- Monotone, bounded consumption of the log.
//! - [`summary`] -- Fleet-wide aggregation, recomputed per read.
//! - [`engine`] -- [`SimulationEngine`] owning the whole pipeline.
//! - [`runner`] -- Async playback loop with shared atomic controls.
//! - [`config`] -- YAML configuration for the playback binary.
//!
//! [`SimulationEngine`]: engine::SimulationEngine

pub mod clock;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod event_log;
pub mod ingest;
pub mod reducer;
pub mod runner;
pub mod summary;
pub mod trips;
