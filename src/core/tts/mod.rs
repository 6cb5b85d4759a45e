//! Speech-synthesis provider adapters.
//!
//! A provider adapter turns one chunk of text into raw audio bytes with a
//! single network call. Adapters are stateless: chunking, caching and retry
//! policy all live in the pipeline, keeping this seam narrow enough that
//! tests can substitute a counting fake.

mod elevenlabs;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::SynthesisResult;

pub use elevenlabs::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID, ElevenLabsClient, VoiceSettings};

/// One-shot text-to-audio conversion against a remote provider.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Convert `text` to audio bytes with a single provider call.
    ///
    /// No chunking, caching or retrying happens here; a failure maps to the
    /// [`crate::errors::SynthesisError`] taxonomy and aborts the call.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> SynthesisResult<Bytes>;
}
