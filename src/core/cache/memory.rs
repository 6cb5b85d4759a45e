//! In-process, TTL-bounded cache tier.
//!
//! Entries carry their creation time and are valid while
//! `now < created_at + ttl`. Expired entries are swept opportunistically on
//! every insert (and dropped on read), so no background timer is needed.
//! The map is shared mutable state across all in-flight synthesis requests
//! and is guarded by a mutex; critical sections are short and never span
//! I/O.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

/// A cached audio buffer with its content type and creation time.
#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Bytes,
    content_type: String,
    created_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.created_at) >= ttl
    }
}

/// Fast, process-local cache tier with time-bounded entries.
pub struct MemoryTier {
    ttl: Duration,
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryTier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a key, returning the audio bytes and content type for a live
    /// entry. An expired entry is removed and treated as absent.
    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl, now) => {
                Some((entry.bytes.clone(), entry.content_type.clone()))
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert an entry with `created_at = now`, sweeping expired entries on
    /// the way in.
    pub fn insert(&self, key: String, bytes: Bytes, content_type: String) {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl, now));
        let swept = before - entries.len();
        if swept > 0 {
            debug!(swept, "swept expired memory-tier entries");
        }

        entries.insert(
            key,
            MemoryEntry {
                bytes,
                content_type,
                created_at: now,
            },
        );
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
