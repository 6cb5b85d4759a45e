//! Configuration for the synthesis pipeline.
//!
//! All knobs are simple scalar values read from environment variables
//! (after an optional `.env` load in the binary). The provider API key is
//! validated up front so a misconfigured deployment fails fast, before any
//! network call.
//!
//! # Environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `ELEVENLABS_API_KEY` | required |
//! | `ELEVENLABS_BASE_URL` | `https://api.elevenlabs.io` |
//! | `VOICE_ID` | `21m00Tcm4TlvDq8ikWAM` |
//! | `MODEL_ID` | `eleven_multilingual_v2` |
//! | `VOICE_STABILITY` / `VOICE_SIMILARITY` / `VOICE_STYLE` / `VOICE_SPEAKER_BOOST` | `0.5` / `0.75` / `0.0` / `true` |
//! | `CACHE_TTL_SECONDS` | `1800` |
//! | `MAX_CHUNK_CHARS` | `300` |
//! | `SYNTHESIS_TIMEOUT_SECONDS` | `30` |
//! | `CHUNK_CONCURRENCY` | `3` |
//! | `AUDIO_CACHE_S3_BUCKET` (+ `_REGION`, `_ENDPOINT`, `_ACCESS_KEY`, `_SECRET_KEY`) | unset |
//! | `AUDIO_CACHE_PATH` | unset |
//! | `AUDIO_CACHE_PREFIX` | `audio-cache` |
//!
//! Durable tier selection: S3 when `AUDIO_CACHE_S3_BUCKET` is set, else the
//! local filesystem when `AUDIO_CACHE_PATH` is set, else an in-process
//! store (the cache then effectively has no durable tier across restarts).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use tracing::info;

use crate::core::tts::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID, VoiceSettings};
use crate::errors::{SynthesisError, SynthesisResult};

/// Default voice when `VOICE_ID` is unset ("Rachel").
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Durable-tier backend selection.
#[derive(Debug, Clone)]
pub enum BlobStoreConfig {
    /// Process-local store; entries do not survive restarts.
    Memory,
    /// Local filesystem rooted at the given directory.
    Local(PathBuf),
    /// Amazon S3 or any S3-compatible endpoint.
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
    },
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Provider settings
    pub api_key: String,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,

    // Pipeline knobs
    pub max_chunk_chars: usize,
    pub chunk_concurrency: usize,
    pub synthesis_timeout: Duration,

    // Cache settings
    pub cache_ttl: Duration,
    pub cache_prefix: Option<String>,
    pub blob_store: BlobStoreConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// * [`SynthesisError::MissingApiKey`] when `ELEVENLABS_API_KEY` is
    ///   absent or blank
    /// * [`SynthesisError::InvalidConfiguration`] when a numeric or boolean
    ///   variable fails to parse
    pub fn from_env() -> SynthesisResult<Self> {
        let api_key = env_opt("ELEVENLABS_API_KEY").ok_or(SynthesisError::MissingApiKey)?;

        let voice_settings = VoiceSettings {
            stability: env_parse("VOICE_STABILITY", 0.5)?,
            similarity_boost: env_parse("VOICE_SIMILARITY", 0.75)?,
            style: env_parse("VOICE_STYLE", 0.0)?,
            use_speaker_boost: env_parse("VOICE_SPEAKER_BOOST", true)?,
        };

        let blob_store = if let Some(bucket) = env_opt("AUDIO_CACHE_S3_BUCKET") {
            BlobStoreConfig::S3 {
                bucket,
                region: env_opt("AUDIO_CACHE_S3_REGION"),
                endpoint: env_opt("AUDIO_CACHE_S3_ENDPOINT"),
                access_key: env_opt("AUDIO_CACHE_S3_ACCESS_KEY"),
                secret_key: env_opt("AUDIO_CACHE_S3_SECRET_KEY"),
            }
        } else if let Some(path) = env_opt("AUDIO_CACHE_PATH") {
            BlobStoreConfig::Local(PathBuf::from(path))
        } else {
            BlobStoreConfig::Memory
        };

        Ok(Self {
            api_key,
            base_url: env_opt("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            voice_id: env_opt("VOICE_ID").unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            model_id: env_opt("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            voice_settings,
            max_chunk_chars: env_parse("MAX_CHUNK_CHARS", 300usize)?,
            chunk_concurrency: env_parse("CHUNK_CONCURRENCY", 3usize)?,
            synthesis_timeout: Duration::from_secs(env_parse("SYNTHESIS_TIMEOUT_SECONDS", 30u64)?),
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECONDS", 1800u64)?),
            cache_prefix: Some(
                env_opt("AUDIO_CACHE_PREFIX").unwrap_or_else(|| "audio-cache".to_string()),
            ),
            blob_store,
        })
    }

    /// Build the configured durable-tier backend.
    pub fn build_store(&self) -> SynthesisResult<Arc<dyn ObjectStore>> {
        match &self.blob_store {
            BlobStoreConfig::Memory => {
                info!("durable cache tier: in-memory (entries will not survive restarts)");
                Ok(Arc::new(InMemory::new()))
            }
            BlobStoreConfig::Local(path) => {
                info!("durable cache tier: local filesystem at {}", path.display());
                std::fs::create_dir_all(path).map_err(|e| {
                    SynthesisError::InvalidConfiguration(format!(
                        "cannot create cache directory {}: {e}",
                        path.display()
                    ))
                })?;
                let store = LocalFileSystem::new_with_prefix(path)?;
                Ok(Arc::new(store))
            }
            BlobStoreConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key,
                secret_key,
            } => {
                info!("durable cache tier: s3 bucket {bucket}");
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    // Custom endpoints (MinIO, localstack) are often plain HTTP.
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(endpoint.starts_with("http://"));
                }
                if let Some(access_key) = access_key {
                    builder = builder.with_access_key_id(access_key);
                }
                if let Some(secret_key) = secret_key {
                    builder = builder.with_secret_access_key(secret_key);
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}

/// Read an environment variable, treating blank values as unset.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to `default` when
/// unset.
fn env_parse<T>(name: &str, default: T) -> SynthesisResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(name) {
        Some(raw) => raw.parse().map_err(|e| {
            SynthesisError::InvalidConfiguration(format!("{name}={raw:?} is invalid: {e}"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; each uses its own variable names
    // to stay independent of test ordering.

    #[test]
    fn test_env_opt_treats_blank_as_unset() {
        // SAFETY: Test-only environment setup, no concurrent access to this key
        unsafe {
            std::env::set_var("COACH_VOICE_TEST_BLANK", "   ");
        }
        assert_eq!(env_opt("COACH_VOICE_TEST_BLANK"), None);
        assert_eq!(env_opt("COACH_VOICE_TEST_NEVER_SET"), None);
    }

    #[test]
    fn test_env_parse_uses_default_when_unset() {
        let value: u64 = env_parse("COACH_VOICE_TEST_UNSET_U64", 1800).unwrap();
        assert_eq!(value, 1800);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        // SAFETY: Test-only environment setup, no concurrent access to this key
        unsafe {
            std::env::set_var("COACH_VOICE_TEST_BAD_U64", "not-a-number");
        }
        let result: SynthesisResult<u64> = env_parse("COACH_VOICE_TEST_BAD_U64", 0);
        assert!(matches!(
            result,
            Err(SynthesisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_env_parse_reads_valid_value() {
        // SAFETY: Test-only environment setup, no concurrent access to this key
        unsafe {
            std::env::set_var("COACH_VOICE_TEST_GOOD_BOOL", "false");
        }
        let value: bool = env_parse("COACH_VOICE_TEST_GOOD_BOOL", true).unwrap();
        assert!(!value);
    }

    fn config_with_store(blob_store: BlobStoreConfig) -> PipelineConfig {
        PipelineConfig {
            api_key: "key".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            voice_settings: VoiceSettings::default(),
            max_chunk_chars: 300,
            chunk_concurrency: 3,
            synthesis_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(1800),
            cache_prefix: None,
            blob_store,
        }
    }

    #[test]
    fn test_memory_store_builds() {
        assert!(config_with_store(BlobStoreConfig::Memory).build_store().is_ok());
    }

    #[test]
    fn test_local_store_builds_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio-cache");
        let config = config_with_store(BlobStoreConfig::Local(path.clone()));
        assert!(config.build_store().is_ok());
        assert!(path.is_dir());
    }
}
