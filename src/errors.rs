//! Error types for the synthesis pipeline.
//!
//! Failures fall into two classes with different propagation rules:
//! provider and validation failures abort the current request, while
//! durable-cache failures are logged at the cache boundary and degrade
//! to a miss or a skipped write (see `core::cache`).

use thiserror::Error;

/// Result type alias for synthesis operations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Errors surfaced to callers of the synthesis pipeline.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Provider API key is absent. Checked at construction, before any
    /// network call is made.
    #[error("synthesis provider API key is not configured")]
    MissingApiKey,

    /// Input text was empty or whitespace-only.
    #[error("cannot synthesize empty text")]
    EmptyText,

    /// The provider reported the usage allowance as exhausted. Not retried.
    #[error("synthesis quota exceeded: {detail}")]
    QuotaExceeded { detail: String },

    /// Non-2xx provider response, with the provider's error detail when the
    /// body was parseable.
    #[error("provider request failed with status {status}: {detail}")]
    Provider { status: u16, detail: String },

    /// Transport-level failure reaching the provider, including timeouts.
    #[error("network error reaching the synthesis provider: {0}")]
    Network(#[from] reqwest::Error),

    /// Durable cache tier failure from an explicit administrative operation
    /// such as `CacheManager::clear`. Read/write failures on the synthesis
    /// path never surface through this variant.
    #[error("durable cache operation failed: {0}")]
    Storage(#[from] object_store::Error),

    /// The request was superseded by a newer request on the same session.
    #[error("synthesis request was cancelled")]
    Cancelled,

    /// Malformed configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
