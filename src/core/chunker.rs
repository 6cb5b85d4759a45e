//! Sentence-boundary text chunking.
//!
//! The synthesis provider enforces a per-request length limit, so long
//! responses are split into provider-safe chunks before synthesis. Splitting
//! happens only at sentence boundaries (`.`, `!`, `?`) and consecutive
//! sentences are greedily packed into each chunk, so no chunk ends
//! mid-sentence. The one exception is a single sentence longer than the
//! limit: it is emitted as its own oversized chunk rather than being cut
//! inside a word.
//!
//! Chunking is pure and lossless: concatenating the returned chunks
//! reproduces the input text byte for byte, including the whitespace
//! between sentences.

/// Split `text` into ordered chunks of at most `max_chars` characters each,
/// breaking only at sentence boundaries.
///
/// # Arguments
/// * `text` - The full input text
/// * `max_chars` - Maximum chunk length in characters (not bytes)
///
/// # Returns
/// Ordered, non-empty chunks whose concatenation equals `text`. A single
/// sentence longer than `max_chars` is returned unsplit as its own chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();

        // Emit the buffer when the next sentence would overflow it. An
        // oversized sentence lands in an empty buffer and passes through
        // whole on the next iteration (or at the end).
        if buffer_chars > 0 && buffer_chars + sentence_chars > max_chars {
            chunks.push(std::mem::take(&mut buffer));
            buffer_chars = 0;
        }

        buffer.push_str(sentence);
        buffer_chars += sentence_chars;
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}

/// Split text into sentences, keeping each sentence's terminal punctuation
/// and any whitespace that follows it attached to that sentence.
///
/// A boundary sits before the first non-whitespace character that follows a
/// run of `.`, `!` or `?`. Text without terminal punctuation is one sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut after_terminator = false;

    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            after_terminator = true;
        } else if after_terminator && !c.is_whitespace() {
            sentences.push(&text[start..i]);
            start = i;
            after_terminator = false;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_a_single_chunk() {
        let text = "Nice work on the squat session today.";
        let chunks = chunk_text(text, 300);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_text_at_exact_limit_is_not_split() {
        let text = "abcde".repeat(60);
        assert_eq!(text.len(), 300);
        let chunks = chunk_text(&text, 300);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_concatenated_chunks_reproduce_input() {
        let text = "First sentence here. Second one follows!  Third, with a pause? Fourth keeps going. \
                    Fifth sentence ends it all."
            .repeat(4);
        let chunks = chunk_text(&text, 80);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_no_chunk_ends_mid_sentence() {
        let text = "One sentence. Two sentences. Three sentences. Four sentences. Five sentences.";
        let chunks = chunk_text(text, 30);
        for chunk in &chunks[..chunks.len() - 1] {
            let trimmed = chunk.trim_end();
            assert!(
                trimmed.ends_with('.') || trimmed.ends_with('!') || trimmed.ends_with('?'),
                "chunk ended mid-sentence: {chunk:?}"
            );
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunks_respect_limit_when_sentences_fit() {
        let sentence = "This sentence is forty characters long.."; // 40 chars
        assert_eq!(sentence.chars().count(), 40);
        let text = sentence.repeat(10);
        let chunks = chunk_text(&text, 120);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 120);
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_oversized_sentence_passes_through_unsplit() {
        let giant = "word ".repeat(100); // no terminal punctuation, 500 chars
        let text = format!("Short intro. {giant}");
        let chunks = chunk_text(&text, 50);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "Short intro. ");
        assert_eq!(chunks[1], giant);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_consecutive_terminators_stay_together() {
        let text = "Really?! Yes... Absolutely! And then some more words to push past the limit here.";
        let chunks = chunk_text(text, 20);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_multibyte_text_counts_characters_not_bytes() {
        // 100 three-byte characters; well over 100 bytes but under the
        // 120-character limit, so it must stay one chunk.
        let text = "日".repeat(100);
        let chunks = chunk_text(&text, 120);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_text("", 300).is_empty());
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let text = "Alpha beta gamma. Delta epsilon zeta! Eta theta iota? Kappa lambda mu.";
        assert_eq!(chunk_text(text, 30), chunk_text(text, 30));
    }
}
