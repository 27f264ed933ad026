//! Error types for the playback binary.
//!
//! [`PlayerError`] is the top-level error type that wraps all failure
//! modes during player startup. Once playback runs, nothing fails: the
//! core degrades per field and per record by design.

use fleetsim_core::config::ConfigError;

use crate::loader::LoaderError;

/// Top-level error for the playback binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Event data loading failed.
    #[error("loader error: {source}")]
    Loader {
        /// The underlying loader error.
        #[from]
        source: LoaderError,
    },

    /// No usable events were found in the data directory.
    #[error("no usable events in {dir}")]
    NoEvents {
        /// The directory that was scanned.
        dir: String,
    },
}
