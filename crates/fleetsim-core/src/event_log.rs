//! The immutable, time-ordered event log.
//!
//! All source sequences are merged once, at build time, into a single
//! vector sorted by timestamp. The sort is stable, so records that share a
//! timestamp keep their relative order from the concatenated sources. After
//! the build the log never changes; playback only ever reads from it.

use tracing::{info, warn};

use fleetsim_types::{PlaybackWindow, RawEventRecord, TelemetryEvent};

use crate::ingest::{self, InvalidEventError, MalformedFieldWarning};

/// What happened while building the log.
///
/// Rejected records and skipped fields are collected here so callers can
/// surface them; they never stop the build.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Total records scanned across all sources.
    pub scanned: usize,
    /// Records that made it into the log.
    pub accepted: usize,
    /// Records excluded from the log, with the reason each was excluded.
    pub rejected: Vec<InvalidEventError>,
    /// Fields skipped on otherwise accepted records.
    pub malformed_fields: Vec<MalformedFieldWarning>,
}

/// The merged, sorted, immutable sequence of telemetry events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TelemetryEvent>,
}

impl EventLog {
    /// Build a log from one record sequence per source.
    ///
    /// Sources are concatenated in the given order, parsed, and stable
    /// sorted by timestamp. Unusable records are excluded and reported;
    /// everything else loads.
    pub fn build(sources: Vec<Vec<RawEventRecord>>) -> (Self, IngestReport) {
        let mut report = IngestReport::default();
        let mut events = Vec::new();

        for (index, record) in sources.into_iter().flatten().enumerate() {
            report.scanned = report.scanned.saturating_add(1);
            match ingest::parse_record(index, &record) {
                Ok(parsed) => {
                    for warning in &parsed.warnings {
                        warn!(%warning, "Skipping malformed field");
                    }
                    report.malformed_fields.extend(parsed.warnings);
                    report.accepted = report.accepted.saturating_add(1);
                    events.push(parsed.event);
                }
                Err(error) => {
                    warn!(%error, "Excluding unusable record");
                    report.rejected.push(error);
                }
            }
        }

        // Stable, so source order breaks timestamp ties.
        events.sort_by_key(|event| event.timestamp);

        info!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            malformed_fields = report.malformed_fields.len(),
            "Event log built"
        );

        (Self { events }, report)
    }

    /// The time range covered by the log, `None` when the log is empty.
    pub fn window(&self) -> Option<PlaybackWindow> {
        let start = self.events.first()?.timestamp;
        let end = self.events.last()?.timestamp;
        Some(PlaybackWindow { start, end })
    }

    /// Number of events in the log.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events at all.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event at `index` in replay order, if any.
    pub fn get(&self, index: usize) -> Option<&TelemetryEvent> {
        self.events.get(index)
    }

    /// All events in replay order.
    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }
}
