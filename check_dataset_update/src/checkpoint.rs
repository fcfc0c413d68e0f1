//! Durable "last downloaded" checkpoint backed by a sled store.
//!
//! The store is opened for one update cycle and released when the handle is
//! dropped. Writes are flushed before `put` returns, so the background
//! flusher is disabled.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// Key under which the last download date is kept.
pub const LAST_DOWNLOADED_KEY: &str = "last_downloaded";

#[derive(Serialize, Deserialize, Debug)]
struct Checkpoint {
    last_downloaded: NaiveDate,
}

/// Scoped handle to the checkpoint store.
pub struct CheckpointStore {
    db: sled::Db,
    path: PathBuf,
}

impl CheckpointStore {
    /// Opens the store at `path`, creating it if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let db = sled::Config::new()
            .path(&path)
            .flush_every_ms(None)
            .open()
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), recovered = db.was_recovered(), "opened checkpoint store");
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<Option<NaiveDate>, StoreError> {
        let value = self.db.get(key).map_err(|source| StoreError::Read {
            key: key.to_string(),
            source,
        })?;

        value.map(|bytes| decode(key, &bytes)).transpose()
    }

    pub fn put(&self, key: &str, date: NaiveDate) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&Checkpoint {
            last_downloaded: date,
        })
        .map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        self.db
            .insert(key, bytes)
            .map_err(|source| StoreError::Write {
                key: key.to_string(),
                source,
            })?;
        self.flush(key)
    }

    /// Removes the checkpoint, returning the date it held.
    pub fn remove(&self, key: &str) -> Result<Option<NaiveDate>, StoreError> {
        let previous = self.db.remove(key).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })?;
        self.flush(key)?;

        previous.map(|bytes| decode(key, &bytes)).transpose()
    }

    /// Flushes outstanding writes and releases the store.
    pub fn close(self) -> Result<(), StoreError> {
        self.flush(LAST_DOWNLOADED_KEY)
    }

    fn flush(&self, key: &str) -> Result<(), StoreError> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|source| StoreError::Write {
                key: key.to_string(),
                source,
            })
    }
}

impl Drop for CheckpointStore {
    fn drop(&mut self) {
        if let Err(e) = self.db.flush() {
            debug!(path = %self.path.display(), error = %e, "flush on close failed");
        }
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<NaiveDate, StoreError> {
    serde_json::from_slice::<Checkpoint>(bytes)
        .map(|checkpoint| checkpoint.last_downloaded)
        .map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })
}
