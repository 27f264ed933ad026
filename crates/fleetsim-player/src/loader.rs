//! Event-file loading for the playback binary.
//!
//! The data directory holds one JSON array of raw event records per file.
//! Each file is one source sequence for the stable merge, and files are
//! read in name order so the source order -- and therefore the tie-break
//! order among equal timestamps -- is deterministic across runs.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fleetsim_types::RawEventRecord;

/// Errors that can occur while loading event files.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// A directory listing or file read failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A file did not hold a JSON array of event records.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The offending file.
        path: PathBuf,
        /// The underlying JSON parse error.
        source: serde_json::Error,
    },
}

/// Load every `*.json` file under `dir` as one source sequence each.
///
/// Files are sorted by name before reading. Non-JSON files and
/// subdirectories are skipped. An empty directory yields an empty source
/// list, which the caller treats as "no events".
///
/// # Errors
///
/// Returns [`LoaderError`] if the directory cannot be listed or any
/// JSON file cannot be read or parsed. Unlike per-record ingest
/// problems, a broken file is a deployment mistake and fails startup.
pub fn load_sources(dir: &Path) -> Result<Vec<Vec<RawEventRecord>>, LoaderError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoaderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let contents = std::fs::read_to_string(&path).map_err(|source| LoaderError::Io {
            path: path.clone(),
            source,
        })?;
        let records: Vec<RawEventRecord> =
            serde_json::from_str(&contents).map_err(|source| LoaderError::Json {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), records = records.len(), "Event file loaded");
        sources.push(records);
    }

    info!(
        dir = %dir.display(),
        files = sources.len(),
        records = sources.iter().map(Vec::len).sum::<usize>(),
        "Event data loaded"
    );
    Ok(sources)
}
