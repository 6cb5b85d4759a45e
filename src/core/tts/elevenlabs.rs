//! ElevenLabs text-to-speech adapter.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base_url}/v1/text-to-speech/{voice_id}`
//! - Auth: `xi-api-key` header
//! - Body: `{ "text", "model_id", "voice_settings" }`
//! - Success: raw audio bytes (`audio/mpeg`)
//! - Failure: non-2xx with a JSON body carrying an optional `detail` field,
//!   either a plain string or `{ "status", "message" }`
//!
//! The adapter performs exactly one network call per invocation with an
//! explicit per-request timeout, and maps provider failures onto the
//! [`SynthesisError`] taxonomy. Quota exhaustion (HTTP 429 or a
//! `quota_exceeded` detail status) gets its own variant so callers can stop
//! retrying immediately.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SpeechSynthesizer;
use crate::errors::{SynthesisError, SynthesisResult};

/// Default ElevenLabs API base URL. Overridable for tests and proxies.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Default synthesis model.
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

// =============================================================================
// Request / Response Messages
// =============================================================================

/// Voice tuning knobs passed through to the provider unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceSettings {
    /// Voice consistency across generations (0.0 - 1.0).
    pub stability: f32,
    /// Adherence to the original voice (0.0 - 1.0).
    pub similarity_boost: f32,
    /// Style exaggeration (0.0 - 1.0).
    pub style: f32,
    /// Boost similarity to the original speaker.
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// Synthesis request body.
#[derive(Debug, Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<ErrorDetail>,
}

/// The `detail` field is either a structured object or a bare string,
/// depending on the failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Text(String),
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the ElevenLabs synthesis endpoint.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl ElevenLabsClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key` - ElevenLabs API key; an empty key fails fast here,
    ///   before any network call
    /// * `base_url` - API base URL (see [`DEFAULT_BASE_URL`])
    /// * `model_id` - Synthesis model (see [`DEFAULT_MODEL_ID`])
    /// * `timeout` - Per-request timeout, independent of any caller timeout
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model_id: impl Into<String>,
        timeout: Duration,
    ) -> SynthesisResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SynthesisError::MissingApiKey);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model_id: model_id.into(),
        })
    }

    fn synthesis_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{voice_id}", self.base_url)
    }

    /// Map a non-2xx response to a typed failure, surfacing the provider's
    /// error detail when the body is parseable.
    fn map_failure(status: u16, body: &str) -> SynthesisError {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let (detail_status, detail) = match parsed.and_then(|b| b.detail) {
            Some(ErrorDetail::Structured { status, message }) => (status, message),
            Some(ErrorDetail::Text(text)) => (None, Some(text)),
            None => (None, None),
        };

        let quota = status == 429 || detail_status.as_deref() == Some("quota_exceeded");
        let detail =
            detail.unwrap_or_else(|| format!("provider returned HTTP {status} with no detail"));

        if quota {
            SynthesisError::QuotaExceeded { detail }
        } else {
            SynthesisError::Provider { status, detail }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> SynthesisResult<Bytes> {
        let body = SynthesisBody {
            text,
            model_id: &self.model_id,
            voice_settings: settings,
        };

        let response = self
            .client
            .post(self.synthesis_url(voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_failure(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        debug!(
            voice_id,
            text_chars = text.chars().count(),
            audio_bytes = bytes.len(),
            "synthesis call complete"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_empty_api_key_fails_before_any_network_call() {
        let result = ElevenLabsClient::new("", DEFAULT_BASE_URL, DEFAULT_MODEL_ID, TIMEOUT);
        assert!(matches!(result, Err(SynthesisError::MissingApiKey)));

        let result = ElevenLabsClient::new("   ", DEFAULT_BASE_URL, DEFAULT_MODEL_ID, TIMEOUT);
        assert!(matches!(result, Err(SynthesisError::MissingApiKey)));
    }

    #[test]
    fn test_synthesis_url_includes_voice_id() {
        let client =
            ElevenLabsClient::new("key", DEFAULT_BASE_URL, DEFAULT_MODEL_ID, TIMEOUT).unwrap();
        assert_eq!(
            client.synthesis_url("EXAVITQu4vr4xnSDxMaL"),
            "https://api.elevenlabs.io/v1/text-to-speech/EXAVITQu4vr4xnSDxMaL"
        );
    }

    #[test]
    fn test_trailing_slash_on_base_url_is_normalized() {
        let client =
            ElevenLabsClient::new("key", "https://proxy.local/", DEFAULT_MODEL_ID, TIMEOUT)
                .unwrap();
        assert_eq!(client.synthesis_url("v"), "https://proxy.local/v1/text-to-speech/v");
    }

    #[test]
    fn test_http_429_maps_to_quota_exceeded() {
        let err = ElevenLabsClient::map_failure(429, "{}");
        assert!(matches!(err, SynthesisError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_quota_detail_status_maps_to_quota_exceeded() {
        let body = r#"{"detail":{"status":"quota_exceeded","message":"You have 12 credits left"}}"#;
        match ElevenLabsClient::map_failure(401, body) {
            SynthesisError::QuotaExceeded { detail } => {
                assert_eq!(detail, "You have 12 credits left");
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_detail_message_is_surfaced() {
        let body = r#"{"detail":{"status":"invalid_voice_id","message":"Voice not found"}}"#;
        match ElevenLabsClient::map_failure(400, body) {
            SynthesisError::Provider { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Voice not found");
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[test]
    fn test_string_detail_is_surfaced() {
        let body = r#"{"detail":"Invalid API key"}"#;
        match ElevenLabsClient::map_failure(401, body) {
            SynthesisError::Provider { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Invalid API key");
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_body_falls_back_to_generic_message() {
        match ElevenLabsClient::map_failure(502, "<html>bad gateway</html>") {
            SynthesisError::Provider { status, detail } => {
                assert_eq!(status, 502);
                assert!(detail.contains("502"));
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[test]
    fn test_voice_settings_serialize_with_provider_field_names() {
        let json = serde_json::to_value(VoiceSettings::default()).unwrap();
        assert_eq!(json["stability"], 0.5);
        assert_eq!(json["similarity_boost"], 0.75);
        assert_eq!(json["style"], 0.0);
        assert_eq!(json["use_speaker_boost"], true);
    }
}
