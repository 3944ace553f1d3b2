//! In-process cache backend.
//!
//! `DashMap` gives sharded concurrent access, so batch workers reading and
//! writing different keys do not contend on a single lock. Expired entries
//! are dropped when read, and by a sweep every `SWEEP_INTERVAL` writes, so
//! keys that are never replayed do not accumulate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::{CacheBackend, CacheEntry, CacheError};

/// Writes between sweeps of expired entries.
pub const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug, Clone)]
struct Stored {
    entry: CacheEntry,
    /// `None` when the TTL overflows the clock.
    expires_at: Option<Instant>,
}

impl Stored {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Stored>,
    writes: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unexpired) entry count.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held in memory, expired or not.
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, stored| !stored.is_expired(now));
        before - self.entries.len()
    }
}

impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(stored) if !stored.is_expired(now) => return Ok(Some(stored.entry.clone())),
            Some(_) => true,
            None => false,
        };
        if hit {
            // Expired: remove unless a concurrent writer refreshed it.
            self.entries.remove_if(key, |_, stored| stored.is_expired(now));
        }
        Ok(None)
    }

    fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Stored {
                entry: entry.clone(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_INTERVAL == 0 {
            let purged = self.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "swept expired idempotency entries");
            }
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(status: u16) -> CacheEntry {
        CacheEntry {
            status,
            headers: BTreeMap::new(),
            body: "{}".to_string(),
        }
    }

    #[test]
    fn expired_entries_miss() {
        let backend = MemoryBackend::new();
        backend.set("a", &entry(200), Duration::ZERO).unwrap();
        assert_eq!(backend.get("a").unwrap(), None);
        assert!(backend.is_empty());
    }

    #[test]
    fn overwrite_last_write_wins() {
        let backend = MemoryBackend::new();
        backend.set("a", &entry(200), Duration::from_secs(60)).unwrap();
        backend.set("a", &entry(201), Duration::from_secs(60)).unwrap();
        assert_eq!(backend.get("a").unwrap().map(|e| e.status), Some(201));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn purge_drops_only_expired() {
        let backend = MemoryBackend::new();
        backend.set("old", &entry(200), Duration::ZERO).unwrap();
        backend.set("new", &entry(200), Duration::from_secs(60)).unwrap();
        assert_eq!(backend.purge_expired(), 1);
        assert!(backend.get("new").unwrap().is_some());
    }

    #[test]
    fn unread_expired_entries_are_swept_on_write() {
        let backend = MemoryBackend::new();
        backend.set("keep", &entry(200), Duration::from_secs(600)).unwrap();
        for i in 0..10_000 {
            backend.set(&format!("once-{i}"), &entry(200), Duration::ZERO).unwrap();
        }
        assert!(
            (backend.stored_len() as u64) <= SWEEP_INTERVAL,
            "retained {}",
            backend.stored_len()
        );
        assert_eq!(backend.len(), 1);
        assert!(backend.get("keep").unwrap().is_some());
    }

    #[test]
    fn huge_ttl_never_expires() {
        let backend = MemoryBackend::new();
        backend.set("forever", &entry(200), Duration::MAX).unwrap();
        assert!(backend.get("forever").unwrap().is_some());
        assert_eq!(backend.purge_expired(), 0);
    }
}
