//! Async playback loop with shared controls.
//!
//! This module provides [`run_playback`], the top-level async function
//! that drives the tick cadence around a [`SimulationEngine`]:
//!
//! - **Fixed cadence**: one tick per real-time interval; speed scales the
//!   simulated step, never the cadence.
//! - **Pause/resume**: the loop sleeps on a [`Notify`] while paused.
//! - **Bounded latency**: a large backlog after a reset or speed jump is
//!   applied in chunks with cooperative yields between them.
//! - **Clean end**: the loop reports whether the log ran out or a stop
//!   was requested.
//!
//! The loop is the only caller of the engine while it runs, so advances
//! are strictly sequential: a tick can never start while the previous one
//! is still applying events.
//!
//! [`Notify`]: tokio::sync::Notify

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{info, warn};

use fleetsim_types::SpeedMultiplier;

use crate::engine::{SimulationEngine, TickReport};

/// Events applied per chunk before yielding back to the scheduler.
const CHUNK_EVENTS: usize = 256;

/// Reason why a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Every event in the log has been applied.
    LogExhausted,
    /// A stop was requested through the controls.
    StopRequested,
}

/// Result of a playback run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackResult {
    /// Why the run ended.
    pub end_reason: EndReason,
    /// Number of ticks executed.
    pub ticks: u64,
}

/// Shared playback control surface.
///
/// Wrapped in [`Arc`](std::sync::Arc) and shared between the playback
/// loop and whatever drives it (a UI task, a signal handler, a test).
/// All fields are atomics so reads on the loop hot path never lock; the
/// [`Notify`] wakes a paused loop when anything changes.
#[derive(Debug)]
pub struct PlaybackControls {
    /// Whether ticks should advance the clock.
    playing: AtomicBool,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Whether a rewind to the log start has been requested.
    reset_requested: AtomicBool,

    /// Current speed factor (always one of the supported values).
    speed_factor: AtomicU64,

    /// Wakes the loop out of a paused wait.
    wake: Notify,
}

impl Default for PlaybackControls {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackControls {
    /// Fresh controls: paused, 1x speed, nothing requested.
    pub const fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            speed_factor: AtomicU64::new(1),
            wake: Notify::const_new(),
        }
    }

    /// Start playback and wake a paused loop. Idempotent.
    pub fn play(&self) {
        self.playing.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Pause playback, keeping the position. Idempotent.
    ///
    /// An advance already in flight finishes; only future ticks stop.
    pub fn pause(&self) {
        self.playing.store(false, Ordering::Release);
    }

    /// Whether ticks currently advance the clock.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Change the speed multiplier, effective from the next tick.
    pub fn set_speed(&self, speed: SpeedMultiplier) {
        self.speed_factor.store(speed.factor(), Ordering::Release);
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> SpeedMultiplier {
        SpeedMultiplier::from_factor(self.speed_factor.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    /// Request a clean stop and wake a paused loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Request a full rewind and wake a paused loop.
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Consume a pending reset request, if any.
    fn take_reset_request(&self) -> bool {
        self.reset_requested.swap(false, Ordering::AcqRel)
    }

    /// Wait until playing, or until a stop or reset request arrives.
    async fn wait_while_paused(&self) {
        while !self.is_playing() && !self.is_stop_requested() {
            if self.reset_requested.load(Ordering::Acquire) {
                return;
            }
            self.wake.notified().await;
        }
    }
}

/// Callback invoked after each tick completes.
///
/// Implementations can log progress, push state to a UI, or collect
/// metrics. The callback receives the tick report and a read-only view
/// of the engine.
pub trait PlaybackObserver: Send {
    /// Called after every executed tick.
    fn on_tick(&mut self, report: &TickReport, engine: &SimulationEngine);
}

/// A no-op observer for tests and silent runs.
pub struct NoOpObserver;

impl PlaybackObserver for NoOpObserver {
    fn on_tick(&mut self, _report: &TickReport, _engine: &SimulationEngine) {}
}

/// Run the playback loop until the log is exhausted or a stop arrives.
///
/// Each iteration applies pending control changes, waits while paused,
/// moves the clock one step and applies the newly eligible events in
/// chunks of [`CHUNK_EVENTS`] with a cooperative yield between chunks,
/// then sleeps one cadence interval. `tick_interval_ms` is the real-time
/// cadence; zero means no sleep (useful in tests).
pub async fn run_playback(
    engine: &mut SimulationEngine,
    controls: &PlaybackControls,
    observer: &mut dyn PlaybackObserver,
    tick_interval_ms: u64,
) -> PlaybackResult {
    let mut ticks: u64 = 0;

    info!(
        events = engine.events_total(),
        tick_interval_ms,
        speed = %controls.speed(),
        "Playback starting"
    );

    loop {
        // --- Apply pending control changes ---
        if controls.take_reset_request() {
            engine.reset();
        }
        if controls.is_stop_requested() {
            info!(ticks, "Playback stop requested");
            return PlaybackResult {
                end_reason: EndReason::StopRequested,
                ticks,
            };
        }
        engine.set_speed(controls.speed());
        if controls.is_playing() {
            engine.play();
        } else {
            engine.pause();
        }

        // --- End of log ---
        if engine.is_exhausted() {
            info!(ticks, "Event log exhausted");
            return PlaybackResult {
                end_reason: EndReason::LogExhausted,
                ticks,
            };
        }

        // --- Wait while paused ---
        if !controls.is_playing() {
            controls.wait_while_paused().await;
            continue;
        }

        // --- Execute one tick, applying the backlog in chunks ---
        let moved = engine.advance_clock();
        let mut applied: usize = 0;
        let mut touched = BTreeSet::new();
        if let Some(target) = moved {
            loop {
                let (summary, more) = engine.apply_up_to(target, CHUNK_EVENTS);
                applied = applied.saturating_add(summary.applied);
                touched.extend(summary.touched);
                if !more {
                    break;
                }
                tokio::task::yield_now().await;
            }
        }
        ticks = ticks.saturating_add(1);

        let report = TickReport {
            time: engine.clock_time(),
            advanced: moved.is_some(),
            applied,
            touched,
            consumed_index: engine.consumed_index(),
        };
        observer.on_tick(&report, engine);

        // --- Sleep one cadence interval ---
        if tick_interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(tick_interval_ms)).await;
        }
    }
}

/// Log the end-of-run report: outcome, per-trip states, fleet summary.
pub fn log_playback_end(result: &PlaybackResult, engine: &SimulationEngine) {
    info!(
        reason = ?result.end_reason,
        ticks = result.ticks,
        consumed = engine.consumed_index(),
        events = engine.events_total(),
        "Playback ended"
    );

    for trip in engine.trips() {
        info!(
            trip = %trip.trip_id,
            status = ?trip.status,
            distance_km = trip.distance_km,
            completion_pct = trip.completion_pct,
            fuel = trip.fuel_level,
            alerts = trip.alerts.len(),
            events = trip.events_processed,
            "Trip final state"
        );
    }

    let summary = engine.summary();
    if summary.total == 0 {
        warn!("Playback ended with no trips reconstructed");
    } else {
        info!(
            total = summary.total,
            in_progress = summary.in_progress,
            completed = summary.completed,
            cancelled = summary.cancelled,
            with_alerts = summary.with_alerts,
            past_50_pct = summary.past_50_pct,
            past_80_pct = summary.past_80_pct,
            total_distance_km = summary.total_distance_km,
            "Fleet summary"
        );
    }
}
