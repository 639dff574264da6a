//! JSON blob store for settings and digest history.
//!
//! Each key lives in its own `<key>.json` file wrapped in a revision stamp.
//! Writes go to a temp file first and are renamed into place, so a reader
//! never sees a partial blob. Reads never fail: anything missing or
//! unparseable falls back to the default.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::StorageError;
use crate::domain::{DigestHistory, DigestResult, Settings};

/// Key for the current settings value.
pub const SETTINGS_KEY: &str = "settings";

/// Key for the bounded, newest-first digest history.
pub const HISTORY_KEY: &str = "digest_history";

/// Key for the redundant copy of the newest digest.
pub const LATEST_KEY: &str = "latest_digest";

/// A blob together with the store revision it was written at.
#[derive(Debug, Serialize, Deserialize)]
struct Stamped<T> {
    revision: u64,
    value: T,
}

/// Blob formats accepted on read: stamped, or a bare value written by hand.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBlob<T> {
    Stamped(Stamped<T>),
    Bare(T),
}

impl<T> From<StoredBlob<T>> for Stamped<T> {
    fn from(blob: StoredBlob<T>) -> Self {
        match blob {
            StoredBlob::Stamped(stamped) => stamped,
            StoredBlob::Bare(value) => Stamped { revision: 0, value },
        }
    }
}

/// Local preference store backed by a data directory.
#[derive(Debug)]
pub struct PreferenceStore {
    dir: PathBuf,
    revision: AtomicU64,
}

impl PreferenceStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let store = Self {
            dir,
            revision: AtomicU64::new(0),
        };

        let highest = [SETTINGS_KEY, HISTORY_KEY, LATEST_KEY]
            .iter()
            .filter_map(|key| store.peek_revision(key))
            .max()
            .unwrap_or(0);
        store.revision.store(highest, Ordering::SeqCst);

        debug!("Opened preference store at {} (revision {})", store.dir.display(), highest);
        Ok(store)
    }

    /// Directory the blobs live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current settings, or the defaults.
    pub fn load(&self) -> Settings {
        self.read_soft::<Settings>(SETTINGS_KEY)
            .map(|stamped| stamped.value)
            .unwrap_or_default()
    }

    /// Overwrite the persisted settings.
    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        self.write_blob(SETTINGS_KEY, settings).map(|_| ())
    }

    /// Digest history as written, or empty.
    pub fn load_history(&self) -> DigestHistory {
        self.read_soft::<DigestHistory>(HISTORY_KEY)
            .map(|stamped| stamped.value)
            .unwrap_or_default()
    }

    /// Overwrite the persisted history.
    pub fn save_history(&self, history: &DigestHistory) -> Result<(), StorageError> {
        self.write_blob(HISTORY_KEY, history).map(|_| ())
    }

    /// The redundant newest-digest copy, if any.
    pub fn load_latest(&self) -> Option<DigestResult> {
        self.read_soft::<DigestResult>(LATEST_KEY).map(|stamped| stamped.value)
    }

    /// History reconciled with the latest-digest copy.
    ///
    /// When the two disagree, whichever blob carries the higher revision wins.
    pub fn load_digest_state(&self) -> DigestHistory {
        let history = self.read_soft::<DigestHistory>(HISTORY_KEY);
        let latest = self.read_soft::<DigestResult>(LATEST_KEY);

        match (history, latest) {
            (None, None) => DigestHistory::new(),
            (Some(history), None) => history.value,
            (None, Some(latest)) => {
                let mut history = DigestHistory::new();
                history.prepend(latest.value);
                history
            }
            (Some(history), Some(latest)) => {
                if history.value.latest() == Some(&latest.value) || history.revision >= latest.revision {
                    history.value
                } else {
                    warn!(
                        "latest_digest (rev {}) is newer than digest_history (rev {}), prepending it",
                        latest.revision, history.revision
                    );
                    let mut merged = history.value;
                    merged.prepend(latest.value);
                    merged
                }
            }
        }
    }

    /// Persist history and its newest entry as one logical commit.
    pub fn save_digest_state(&self, history: &DigestHistory) -> Result<(), StorageError> {
        self.write_blob(HISTORY_KEY, history)?;
        match history.latest() {
            Some(latest) => self.write_blob(LATEST_KEY, latest).map(|_| ()),
            None => self.remove_blob(LATEST_KEY),
        }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Stamped<T>>, StorageError> {
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let blob: StoredBlob<T> = serde_json::from_str(&content)?;
        Ok(Some(blob.into()))
    }

    fn read_soft<T: DeserializeOwned>(&self, key: &str) -> Option<Stamped<T>> {
        match self.read_blob(key) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Ignoring unreadable {} blob: {}", key, e);
                None
            }
        }
    }

    fn peek_revision(&self, key: &str) -> Option<u64> {
        self.read_blob::<serde_json::Value>(key)
            .ok()
            .flatten()
            .map(|stamped| stamped.revision)
    }

    fn write_blob<T: Serialize>(&self, key: &str, value: &T) -> Result<u64, StorageError> {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let content = serde_json::to_string_pretty(&Stamped { revision, value })?;

        let path = self.blob_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let mut file = File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;

        debug!("Wrote {} at revision {}", key, revision);
        Ok(revision)
    }

    fn remove_blob(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
