//! Chunked text-to-speech pipeline with a two-tier audio cache.
//!
//! Turns arbitrary-length coach-response text into one playable audio
//! buffer: text is split into provider-safe chunks on sentence boundaries,
//! each chunk is resolved through a memory + object-store cache or a single
//! ElevenLabs call, and the per-chunk audio is concatenated in order.
//!
//! # Example
//! ```rust,no_run
//! use coach_voice::{PipelineConfig, SynthesisPipeline, SynthesisRequest, VoiceSettings};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_env()?;
//! let pipeline = SynthesisPipeline::from_config(&config)?;
//!
//! let audio = pipeline
//!     .speak(&SynthesisRequest {
//!         text: "Great set! Rest ninety seconds, then we go again.".to_string(),
//!         voice_id: config.voice_id.clone(),
//!         settings: VoiceSettings::default(),
//!     })
//!     .await?;
//! std::fs::write("coach.mp3", &audio.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod errors;

// Re-export commonly used items for convenience
pub use config::{BlobStoreConfig, PipelineConfig};
pub use core::*;
pub use errors::{SynthesisError, SynthesisResult};
