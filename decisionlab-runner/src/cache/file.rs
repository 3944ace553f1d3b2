//! Filesystem cache backend: one JSON record per key.
//!
//! File names are the BLAKE3 hex digest of the namespaced key, so arbitrary
//! client keys never touch path syntax. Writes go to a temp file first and
//! are renamed into place, so a reader sees either the old or the new record.
//! Records carry an absolute UTC expiry and survive process restarts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::{CacheBackend, CacheEntry, CacheError};

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    key: String,
    expires_at: DateTime<Utc>,
    entry: CacheEntry,
}

#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    available: bool,
}

impl FileBackend {
    /// Create the directory and probe it with a write. A failed probe leaves
    /// the backend unavailable.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let available = match probe(&dir) {
            Ok(()) => true,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "file cache probe failed");
                false
            }
        };
        Self { dir, available }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes());
        self.dir.join(format!("{}.json", hash.to_hex()))
    }
}

fn probe(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)
}

fn ttl_to_chrono(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500))
}

impl CacheBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.record_path(key);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: Record = match serde_json::from_str(&json) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache record, treating as miss");
                return Ok(None);
            }
        };
        // Digest collision or a record moved between directories.
        if record.key != key {
            return Ok(None);
        }
        if Utc::now() >= record.expires_at {
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(record.entry))
    }

    fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl_to_chrono(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let record = Record {
            key: key.to_string(),
            expires_at,
            entry: entry.clone(),
        };
        let json = serde_json::to_vec(&record)?;

        let path = self.record_path(key);
        let tmp = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        match std::fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
