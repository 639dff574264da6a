//! Local persistence for Paperboy.
//!
//! A small key-value area of JSON blobs used as a cache for settings and
//! digest history. It is never the system of record, so every read fails
//! soft and every write error is reported but never fatal.

mod prefs;

use thiserror::Error;

pub use prefs::{HISTORY_KEY, LATEST_KEY, PreferenceStore, SETTINGS_KEY};

/// Local persistence failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
