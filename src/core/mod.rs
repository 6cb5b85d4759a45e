pub mod assembler;
pub mod cache;
pub mod chunker;
pub mod pipeline;
pub mod tts;

// Re-export commonly used types for convenience
pub use assembler::concatenate;
pub use cache::{AUDIO_CONTENT_TYPE, BlobTier, CacheManager, MemoryTier, cache_key};
pub use chunker::chunk_text;
pub use pipeline::{AssembledAudio, SpeakSession, SpeakState, SynthesisPipeline, SynthesisRequest};
pub use tts::{
    DEFAULT_BASE_URL, DEFAULT_MODEL_ID, ElevenLabsClient, SpeechSynthesizer, VoiceSettings,
};
