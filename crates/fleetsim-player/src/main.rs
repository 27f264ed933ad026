//! Headless playback binary for the Fleetsim replay engine.
//!
//! Loads a directory of JSON event files, builds the merged event log,
//! and replays it against the virtual clock until the log is exhausted,
//! logging progress along the way and a per-trip plus fleet summary at
//! the end.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `fleetsim-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load event files from the data directory
//! 4. Build the merged, ordered event log
//! 5. Assemble the simulation engine and playback controls
//! 6. Run the playback loop (Ctrl-C requests a clean stop)
//! 7. Log the result

mod error;
mod loader;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fleetsim_core::config::PlaybackConfig;
use fleetsim_core::engine::SimulationEngine;
use fleetsim_core::event_log::EventLog;
use fleetsim_core::runner::{self, PlaybackControls, PlaybackObserver};

use crate::error::PlayerError;

/// Application entry point for the playback binary.
///
/// # Errors
///
/// Returns an error if configuration or event data cannot be loaded, or
/// if the data directory holds no usable events.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("fleetsim-player starting");
    info!(
        tick_interval_ms = config.playback.tick_interval_ms,
        step_ms = config.playback.step_ms,
        speed = config.playback.speed,
        autoplay = config.playback.autoplay,
        data_dir = config.data.dir,
        "Configuration loaded"
    );

    // 3. Load event files.
    let data_dir = Path::new(&config.data.dir);
    let sources = loader::load_sources(data_dir)?;

    // 4. Build the merged event log.
    let (log, report) = EventLog::build(sources);
    info!(
        scanned = report.scanned,
        accepted = report.accepted,
        rejected = report.rejected.len(),
        malformed_fields = report.malformed_fields.len(),
        "Event log built"
    );
    if log.is_empty() {
        return Err(PlayerError::NoEvents {
            dir: config.data.dir.clone(),
        }
        .into());
    }

    // 5. Assemble the engine and controls.
    let mut engine = SimulationEngine::new(log, config.playback.step_ms);
    if let Some(window) = engine.window() {
        info!(
            start = %window.start,
            end = %window.end,
            events = engine.events_total(),
            "Playback window"
        );
    }

    let controls = Arc::new(PlaybackControls::new());
    controls.set_speed(config.playback.speed_multiplier().map_err(PlayerError::from)?);
    if config.playback.autoplay {
        controls.play();
    } else {
        info!("Autoplay disabled; waiting for Ctrl-C");
    }

    // Ctrl-C requests a clean stop; the loop finishes its current tick.
    let stop_controls = Arc::clone(&controls);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping playback");
            stop_controls.request_stop();
        }
    });

    // 6. Run the playback loop.
    let mut observer = ProgressObserver::new(config.logging.progress_every_ticks);
    let result = runner::run_playback(
        &mut engine,
        &controls,
        &mut observer,
        config.playback.tick_interval_ms,
    )
    .await;

    // 7. Log results.
    runner::log_playback_end(&result, &engine);

    info!(
        end_reason = ?result.end_reason,
        ticks = result.ticks,
        "fleetsim-player shutdown complete"
    );

    Ok(())
}

/// Load the playback configuration from `fleetsim-config.yaml`.
///
/// Looks for the config file relative to the current working directory
/// and falls back to defaults when it does not exist.
fn load_config() -> Result<PlaybackConfig, PlayerError> {
    let config_path = Path::new("fleetsim-config.yaml");
    if config_path.exists() {
        let config = PlaybackConfig::from_file(config_path)?;
        Ok(config)
    } else {
        Ok(PlaybackConfig::default())
    }
}

/// Periodic progress logging through the observer seam.
struct ProgressObserver {
    /// Emit a progress line every this many ticks (0 = never).
    every: u64,
    /// Ticks seen so far.
    ticks: u64,
}

impl ProgressObserver {
    const fn new(every: u64) -> Self {
        Self { every, ticks: 0 }
    }
}

impl PlaybackObserver for ProgressObserver {
    fn on_tick(&mut self, report: &fleetsim_core::engine::TickReport, engine: &SimulationEngine) {
        self.ticks = self.ticks.saturating_add(1);
        if self.every == 0 || !self.ticks.is_multiple_of(self.every) {
            return;
        }

        let summary = engine.summary();
        match report.time {
            Some(time) => info!(
                tick = self.ticks,
                time = %time,
                consumed = report.consumed_index,
                events = engine.events_total(),
                trips = summary.total,
                in_progress = summary.in_progress,
                completed = summary.completed,
                cancelled = summary.cancelled,
                with_alerts = summary.with_alerts,
                "Playback progress"
            ),
            None => warn!(tick = self.ticks, "Progress tick without a clock"),
        }
    }
}
