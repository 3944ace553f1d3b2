//! Idempotency cache for decision responses.
//!
//! `IdempotencyCache` is total: backend failures are logged and reported as
//! a miss or `false`, never as an error. Keys are namespaced as
//! `"<prefix>:<key>"` before reaching a backend.
//!
//! There is no locking around get-then-set. Two concurrent requests with
//! the same key may both compute and both store; the last write wins.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{CacheBackendKind, CacheSection};

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Stored response, replayed verbatim on a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache record could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("cache backend unavailable")]
    Unavailable,
}

/// Storage behind the idempotency cache. Fallible; the wrapper absorbs errors.
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// `Ok(None)` for absent or expired keys.
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError>;

    /// `Ok(true)` when something was removed.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

/// Backend that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

impl CacheBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::Unavailable)
    }

    fn set(&self, _key: &str, _entry: &CacheEntry, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable)
    }

    fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable)
    }
}

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

pub struct IdempotencyCache {
    backend: Box<dyn CacheBackend>,
    prefix: String,
    ttl: Duration,
}

impl std::fmt::Debug for IdempotencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyCache")
            .field("backend", &self.backend.name())
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl IdempotencyCache {
    pub fn new(backend: Box<dyn CacheBackend>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), "idempotency", DEFAULT_TTL)
    }

    pub fn disabled() -> Self {
        Self::new(Box::new(DisabledBackend), "idempotency", DEFAULT_TTL)
    }

    /// Build the configured backend. A file backend that fails its probe
    /// stays in place and reports unavailable.
    pub fn from_config(config: &CacheSection) -> Self {
        let backend: Box<dyn CacheBackend> = match config.backend {
            CacheBackendKind::Memory => Box::new(MemoryBackend::new()),
            CacheBackendKind::File => Box::new(FileBackend::new(&config.dir)),
            CacheBackendKind::Disabled => Box::new(DisabledBackend),
        };
        if backend.is_available() {
            info!(backend = backend.name(), ttl_secs = config.ttl_secs, "idempotency cache ready");
        } else {
            warn!(backend = backend.name(), "idempotency cache unavailable, requests will not be deduplicated");
        }
        Self::new(backend, config.key_prefix.clone(), Duration::from_secs(config.ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Namespaced key as stored by the backend.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        if !self.is_available() {
            return None;
        }
        match self.backend.get(&self.storage_key(key)) {
            Ok(entry) => entry,
            Err(e) => {
                error!(backend = self.backend.name(), key, error = %e, "cache get failed");
                None
            }
        }
    }

    /// Store with the configured TTL.
    pub fn set(&self, key: &str, entry: &CacheEntry) -> bool {
        self.set_with_ttl(key, entry, self.ttl)
    }

    pub fn set_with_ttl(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.backend.set(&self.storage_key(key), entry, ttl) {
            Ok(()) => true,
            Err(e) => {
                error!(backend = self.backend.name(), key, error = %e, "cache set failed");
                false
            }
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.backend.delete(&self.storage_key(key)) {
            Ok(removed) => removed,
            Err(e) => {
                error!(backend = self.backend.name(), key, error = %e, "cache delete failed");
                false
            }
        }
    }
}
