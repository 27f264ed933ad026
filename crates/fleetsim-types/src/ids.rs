//! Type-safe identifier wrapper for trips.
//!
//! Trip identifiers arrive as opaque strings on the wire (e.g.
//! `"TRIP-2024-0601"`). Wrapping them in a newtype keeps them from being
//! mixed up with other string-ish values at compile time and gives them a
//! stable ordering so they can key `BTreeMap`/`BTreeSet` collections.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a tracked trip.
///
/// Compares and hashes as the underlying string. The replay core never
/// generates trip IDs itself; they are taken verbatim from ingested events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TripId(pub String);

impl TripId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for TripId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TripId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TripId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<TripId> for String {
    fn from(id: TripId) -> Self {
        id.0
    }
}
