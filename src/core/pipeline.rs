//! The "speak" pipeline: chunk → per-chunk cache lookup → synthesis on
//! miss → cache write → ordered concatenation.
//!
//! One top-level request runs as an independent task. Per-chunk fetches run
//! with bounded parallelism through an order-preserving stream, so workers
//! may finish out of order while the assembled audio always follows the
//! original chunk order. Any chunk failure aborts the whole request: the
//! caller receives one complete playable buffer or one descriptive error,
//! never partial audio.

use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::core::assembler::concatenate;
use crate::core::cache::{AUDIO_CONTENT_TYPE, CacheManager, cache_key};
use crate::core::chunker::chunk_text;
use crate::core::tts::{ElevenLabsClient, SpeechSynthesizer, VoiceSettings};
use crate::errors::{SynthesisError, SynthesisResult};

/// Immutable input to one top-level synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub settings: VoiceSettings,
}

/// The final artifact returned to the caller.
#[derive(Debug, Clone)]
pub struct AssembledAudio {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Orchestrator tying the chunker, cache, synthesizer and assembler
/// together for one logical request at a time.
pub struct SynthesisPipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    cache: Arc<CacheManager>,
    max_chunk_chars: usize,
    chunk_concurrency: usize,
}

impl SynthesisPipeline {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        cache: Arc<CacheManager>,
        max_chunk_chars: usize,
        chunk_concurrency: usize,
    ) -> Self {
        Self {
            synthesizer,
            cache,
            max_chunk_chars,
            chunk_concurrency: chunk_concurrency.max(1),
        }
    }

    /// Assemble a pipeline from configuration: an ElevenLabs client and a
    /// two-tier cache over the configured object store.
    pub fn from_config(config: &PipelineConfig) -> SynthesisResult<Self> {
        let client = ElevenLabsClient::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.model_id.clone(),
            config.synthesis_timeout,
        )?;
        let cache = CacheManager::new(
            config.build_store()?,
            config.cache_prefix.clone(),
            config.cache_ttl,
        );
        Ok(Self::new(
            Arc::new(client),
            Arc::new(cache),
            config.max_chunk_chars,
            config.chunk_concurrency,
        ))
    }

    /// Shared cache handle, for administrative operations such as `clear`.
    pub fn cache(&self) -> Arc<CacheManager> {
        Arc::clone(&self.cache)
    }

    /// Synthesize the full request text into one playable audio buffer.
    pub async fn speak(&self, request: &SynthesisRequest) -> SynthesisResult<AssembledAudio> {
        self.speak_cancellable(request, &CancellationToken::new())
            .await
    }

    /// `speak` with external cancellation; remaining chunk fetches stop as
    /// soon as the token fires. Chunks already cached stay valid for later
    /// requests.
    pub async fn speak_cancellable(
        &self,
        request: &SynthesisRequest,
        cancel: &CancellationToken,
    ) -> SynthesisResult<AssembledAudio> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let chunks = chunk_text(&request.text, self.max_chunk_chars);
        info!(
            voice_id = %request.voice_id,
            text_chars = request.text.chars().count(),
            chunk_count = chunks.len(),
            "synthesis request"
        );

        // Single-chunk requests cache the whole result under one key; the
        // multi-chunk path keys each chunk separately so later requests can
        // reuse any subset.
        let buffers = if chunks.len() == 1 {
            vec![self.fetch_chunk(&chunks[0], request, cancel).await?]
        } else {
            // Futures are built up front rather than lazily inside the
            // stream, keeping the overall future spawnable as a task.
            let fetches: Vec<_> = chunks
                .iter()
                .map(|chunk| self.fetch_chunk(chunk, request, cancel))
                .collect();
            stream::iter(fetches)
                .buffered(self.chunk_concurrency)
                .try_collect::<Vec<Bytes>>()
                .await?
        };

        let bytes = concatenate(buffers);
        info!(audio_bytes = bytes.len(), "synthesis complete");

        Ok(AssembledAudio {
            bytes,
            content_type: AUDIO_CONTENT_TYPE.to_string(),
        })
    }

    /// Resolve one chunk: cache hit, or provider call followed by a cache
    /// write. At most one network call per chunk that was not already
    /// cached.
    async fn fetch_chunk(
        &self,
        chunk: &str,
        request: &SynthesisRequest,
        cancel: &CancellationToken,
    ) -> SynthesisResult<Bytes> {
        if cancel.is_cancelled() {
            return Err(SynthesisError::Cancelled);
        }

        let key = cache_key(&request.voice_id, chunk);
        if let Some((bytes, _)) = self.cache.get(&key).await {
            debug!(chunk_chars = chunk.chars().count(), "chunk served from cache");
            return Ok(bytes);
        }

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
            result = self
                .synthesizer
                .synthesize(chunk, &request.voice_id, &request.settings) => result?,
        };

        self.cache
            .put(key, bytes.clone(), AUDIO_CONTENT_TYPE)
            .await;
        Ok(bytes)
    }
}

// =============================================================================
// Speak Session
// =============================================================================

/// Lifecycle of the current request on a [`SpeakSession`].
#[derive(Clone)]
pub enum SpeakState {
    Idle,
    InFlight(CancellationToken),
    Done(AssembledAudio),
    Failed(String),
}

/// Per-caller handle owning the single in-flight request.
///
/// Starting a new `speak` cancels the previous request's remaining chunk
/// fetches; the superseded call returns [`SynthesisError::Cancelled`].
/// Chunks the cancelled request already cached remain valid and reusable.
pub struct SpeakSession {
    pipeline: Arc<SynthesisPipeline>,
    state: Mutex<SpeakState>,
}

impl SpeakSession {
    pub fn new(pipeline: Arc<SynthesisPipeline>) -> Self {
        Self {
            pipeline,
            state: Mutex::new(SpeakState::Idle),
        }
    }

    /// Synthesize `request`, cancelling any request already in flight on
    /// this session.
    pub async fn speak(&self, request: SynthesisRequest) -> SynthesisResult<AssembledAudio> {
        let token = CancellationToken::new();
        {
            let mut state = self.state.lock();
            if let SpeakState::InFlight(previous) = &*state {
                debug!("superseding in-flight synthesis request");
                previous.cancel();
            }
            *state = SpeakState::InFlight(token.clone());
        }

        let result = self.pipeline.speak_cancellable(&request, &token).await;

        let mut state = self.state.lock();
        if token.is_cancelled() {
            // A newer request superseded this one while it ran; its state
            // belongs to the newer request now.
            return Err(SynthesisError::Cancelled);
        }
        match result {
            Ok(audio) => {
                *state = SpeakState::Done(audio.clone());
                Ok(audio)
            }
            Err(e) => {
                *state = SpeakState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Snapshot of the session state, for callers polling progress. `Done`
    /// carries the last assembled audio, `Failed` the last error message.
    pub fn state(&self) -> SpeakState {
        self.state.lock().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(&*self.state.lock(), SpeakState::InFlight(_))
    }
}
