//! Durable cache tier backed by an object store.
//!
//! Entries live in any [`ObjectStore`] implementation (S3, local filesystem,
//! in-memory) under an optional key prefix, named by the cache key plus a
//! fixed `.mp3` suffix. Unlike the memory tier, durable entries carry no TTL
//! and survive restarts; they act as a second-chance store for the life of
//! the service.
//!
//! Every operation here degrades instead of failing: a read error is a miss,
//! a write error is a no-op, both logged. Synthesis must stay correct (if
//! slower) when this tier is unreachable. The one exception is
//! [`BlobTier::clear`], an explicit administrative operation that reports
//! its errors.

use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStore, PutOptions, PutPayload,
};
use tracing::{debug, warn};

use crate::errors::SynthesisResult;

/// File extension appended to cache keys to form object names.
const AUDIO_EXTENSION: &str = ".mp3";

/// Durable, network-backed cache tier.
pub struct BlobTier {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl BlobTier {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Self { store, prefix }
    }

    /// Build the object path for a cache key: `{prefix}/{key}.mp3`.
    ///
    /// Keys are opaque strings and may contain characters the store rejects;
    /// an unparseable path is reported as `None` and the caller treats the
    /// entry as uncacheable in this tier.
    fn object_path(&self, key: &str) -> Option<ObjectPath> {
        let raw = match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}{AUDIO_EXTENSION}"),
            None => format!("{key}{AUDIO_EXTENSION}"),
        };
        match ObjectPath::parse(&raw) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("cache key {key:?} does not form a valid object path: {e}");
                None
            }
        }
    }

    /// Fetch a cached entry. Absent entries and all store errors return
    /// `None`; errors are logged but never propagated.
    pub async fn download(&self, key: &str) -> Option<(Bytes, Option<String>)> {
        let path = self.object_path(key)?;

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => return None,
            Err(e) => {
                warn!("durable cache read failed for {path}, treating as miss: {e}");
                return None;
            }
        };

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());

        match result.bytes().await {
            Ok(bytes) => {
                debug!(%path, size = bytes.len(), "durable cache hit");
                Some((bytes, content_type))
            }
            Err(e) => {
                warn!("durable cache body read failed for {path}, treating as miss: {e}");
                None
            }
        }
    }

    /// Store an entry, overwriting any existing object. Failures are logged
    /// and swallowed; the audio was already produced and is usable.
    pub async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) {
        let Some(path) = self.object_path(key) else {
            return;
        };

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let size = bytes.len();
        let result = self
            .store
            .put_opts(
                &path,
                PutPayload::from(bytes.clone()),
                PutOptions::from(attributes),
            )
            .await;

        // Some backends (the local filesystem among them) reject attribute
        // writes outright. The entry is still worth keeping; store it plain
        // and let the read path default the content type.
        let result = match result {
            Err(ObjectStoreError::NotImplemented) => {
                debug!(%path, "backend rejected attributes, storing entry without them");
                self.store.put(&path, PutPayload::from(bytes)).await
            }
            other => other,
        };

        match result {
            Ok(_) => debug!(%path, size, "durable cache write complete"),
            Err(e) => warn!("durable cache write failed for {path}, skipping: {e}"),
        }
    }

    /// Delete every object enumerable under this tier's prefix, returning
    /// the number removed.
    pub async fn clear(&self) -> SynthesisResult<usize> {
        let prefix_path = match &self.prefix {
            Some(prefix) => Some(ObjectPath::parse(prefix).map_err(object_store::Error::from)?),
            None => None,
        };

        let objects: Vec<_> = self.store.list(prefix_path.as_ref()).try_collect().await?;
        let mut removed = 0usize;
        for meta in objects {
            self.store.delete(&meta.location).await?;
            removed += 1;
        }

        debug!(removed, "durable cache cleared");
        Ok(removed)
    }
}
