//! Two-tier audio cache.
//!
//! The memory tier is fast, process-local and time-bounded; the durable
//! tier is a network-backed object store whose entries never expire and
//! serve as a second-chance store across restarts. Reads check memory
//! first, fall back to the durable tier and backfill memory on a durable
//! hit. Writes land in memory synchronously and in the durable tier
//! fire-and-forget, off the synthesis critical path.
//!
//! Durable-tier failures degrade to a miss (reads) or a skipped write
//! (writes) and never propagate to the caller.

mod blob;
mod key;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use object_store::ObjectStore;
use tracing::debug;

use crate::errors::SynthesisResult;

pub use blob::BlobTier;
pub use key::cache_key;
pub use memory::MemoryTier;

/// Content type recorded for entries whose durable copy predates content
/// type attributes, and the default for everything the pipeline stores.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Two-tier cache shared by all in-flight synthesis requests.
pub struct CacheManager {
    memory: MemoryTier,
    blob: Arc<BlobTier>,
}

impl CacheManager {
    /// Create a cache over the given object store.
    ///
    /// # Arguments
    /// * `store` - Durable tier backend (S3, local filesystem or in-memory)
    /// * `prefix` - Optional key prefix isolating this cache's objects
    /// * `memory_ttl` - Time-to-live for memory-tier entries
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>, memory_ttl: Duration) -> Self {
        Self {
            memory: MemoryTier::new(memory_ttl),
            blob: Arc::new(BlobTier::new(store, prefix)),
        }
    }

    /// Look up a key: memory tier first, then the durable tier. A durable
    /// hit backfills the memory tier before returning.
    pub async fn get(&self, key: &str) -> Option<(Bytes, String)> {
        if let Some(hit) = self.memory.get(key) {
            debug!(key, "memory-tier cache hit");
            return Some(hit);
        }

        let (bytes, content_type) = self.blob.download(key).await?;
        let content_type = content_type.unwrap_or_else(|| AUDIO_CONTENT_TYPE.to_string());
        self.memory
            .insert(key.to_string(), bytes.clone(), content_type.clone());
        Some((bytes, content_type))
    }

    /// Write an entry to both tiers. The memory write is synchronous; the
    /// durable write is spawned off the critical path and its failure is
    /// logged by the durable tier, never surfaced here.
    pub async fn put(&self, key: String, bytes: Bytes, content_type: &str) {
        self.memory
            .insert(key.clone(), bytes.clone(), content_type.to_string());

        let blob = Arc::clone(&self.blob);
        let content_type = content_type.to_string();
        tokio::spawn(async move {
            blob.upload(&key, bytes, &content_type).await;
        });
    }

    /// Empty the memory tier and delete every key enumerable from the
    /// durable tier. Returns the number of durable entries removed.
    pub async fn clear(&self) -> SynthesisResult<usize> {
        self.memory.clear();
        self.blob.clear().await
    }

    /// Number of live-or-expired memory-tier entries; used by tests and the
    /// CLI's cache report.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }
}
