//! Cache key derivation.
//!
//! A key is the voice identifier and the exact chunk text joined with a
//! colon. The text is used verbatim, exactly as sent to the provider, so
//! identical requests always collide to the same key and a one-character
//! difference produces a different key. No normalization happens here; if a
//! caller wants normalized text reflected in cache hits, it normalizes
//! before synthesis and before key derivation.

/// Derive the cache key for one chunk of text under one voice.
///
/// Pure and deterministic. Case and whitespace are significant.
pub fn cache_key(voice_id: &str, text: &str) -> String {
    format!("{voice_id}:{text}")
}
