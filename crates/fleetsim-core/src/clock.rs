//! Virtual clock driving playback time.
//!
//! The clock is the single source of truth for the current position on the
//! replay timeline. Real time never touches it directly: the runner calls
//! [`VirtualClock::tick`] at a fixed cadence, and each tick advances the
//! simulated time by one step scaled by the speed multiplier.
//!
//! # Design Principles
//!
//! - Speed scales the simulated step per tick, never the tick cadence.
//! - The clock can never leave the playback window: every advance clamps
//!   to the window end and stays pinned there.
//! - Reaching the end does not flip the playing flag; pausing is always an
//!   explicit operation.

use chrono::{DateTime, TimeDelta, Utc};

use fleetsim_types::{PlaybackWindow, SpeedMultiplier};

/// Virtual clock for a fixed playback window.
///
/// Starts paused at the window start. All advancing happens through
/// [`VirtualClock::tick`]; control operations only flip flags or move the
/// position back to the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualClock {
    /// Current position on the virtual timeline.
    time: DateTime<Utc>,

    /// Whether ticks currently advance the clock.
    playing: bool,

    /// Multiplier applied to the step on each tick.
    speed: SpeedMultiplier,

    /// The closed range the clock is confined to.
    window: PlaybackWindow,

    /// Simulated milliseconds added per tick at 1x speed.
    step_ms: u64,
}

impl VirtualClock {
    /// Create a paused clock positioned at the window start.
    ///
    /// `step_ms` is the simulated duration covered by one tick at 1x speed.
    /// A zero step parks the clock: ticks never move it.
    pub const fn new(window: PlaybackWindow, step_ms: u64) -> Self {
        Self {
            time: window.start,
            playing: false,
            speed: SpeedMultiplier::X1,
            window,
            step_ms,
        }
    }

    /// Start advancing on subsequent ticks. Idempotent.
    pub const fn play(&mut self) {
        self.playing = true;
    }

    /// Stop advancing on subsequent ticks, keeping the position. Idempotent.
    pub const fn pause(&mut self) {
        self.playing = false;
    }

    /// Change the speed multiplier, effective from the next tick.
    pub const fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.speed = speed;
    }

    /// Advance the clock by one tick.
    ///
    /// Returns the new position, or `None` when the clock did not move:
    /// paused, already pinned at the window end, or parked with a zero
    /// step. The position never exceeds the window end.
    pub fn tick(&mut self) -> Option<DateTime<Utc>> {
        if !self.playing || self.time >= self.window.end {
            return None;
        }

        let delta_ms = self.step_ms.saturating_mul(self.speed.factor());
        if delta_ms == 0 {
            return None;
        }

        let delta = i64::try_from(delta_ms).map_or(TimeDelta::MAX, TimeDelta::milliseconds);
        let next = self
            .time
            .checked_add_signed(delta)
            .map_or(self.window.end, |candidate| {
                candidate.min(self.window.end)
            });
        self.time = next;
        Some(next)
    }

    /// Rewind the position to the window start, returning it.
    ///
    /// The playing flag and speed are left as they are.
    pub const fn reset(&mut self) -> DateTime<Utc> {
        self.time = self.window.start;
        self.time
    }

    /// Current position on the virtual timeline.
    pub const fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Whether ticks currently advance the clock.
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current speed multiplier.
    pub const fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    /// The window the clock is confined to.
    pub const fn window(&self) -> PlaybackWindow {
        self.window
    }

    /// Simulated milliseconds covered per tick at 1x speed.
    pub const fn step_ms(&self) -> u64 {
        self.step_ms
    }

    /// Whether the position is pinned at the window end.
    pub fn at_end(&self) -> bool {
        self.time >= self.window.end
    }
}
