//! Fleet-wide aggregation over trip states.
//!
//! The summary is derived data: computed from scratch on every read, never
//! cached or updated incrementally. With fleet sizes in the hundreds this
//! is cheaper than keeping counters honest through resets and replays.

use fleetsim_types::{FleetSummary, TripState, TripStatus};

/// Compute the fleet summary for the given trip states.
pub fn summarize<'a, I>(trips: I) -> FleetSummary
where
    I: IntoIterator<Item = &'a TripState>,
{
    let mut summary = FleetSummary::default();
    let mut total_distance = 0.0_f64;

    for trip in trips {
        summary.total = summary.total.saturating_add(1);
        match trip.status {
            TripStatus::InProgress => {
                summary.in_progress = summary.in_progress.saturating_add(1);
            }
            TripStatus::Completed => {
                summary.completed = summary.completed.saturating_add(1);
            }
            TripStatus::Cancelled => {
                summary.cancelled = summary.cancelled.saturating_add(1);
            }
            TripStatus::NotStarted => {}
        }
        if trip.has_alerts() {
            summary.with_alerts = summary.with_alerts.saturating_add(1);
        }
        if trip.completion_pct >= 50 {
            summary.past_50_pct = summary.past_50_pct.saturating_add(1);
        }
        if trip.completion_pct >= 80 {
            summary.past_80_pct = summary.past_80_pct.saturating_add(1);
        }
        total_distance += trip.distance_km;
    }

    summary.total_distance_km = round_one_decimal(total_distance);
    summary
}

/// Round to one decimal place for display.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
