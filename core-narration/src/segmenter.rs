//! # Segmenter
//!
//! Turns prose into an ordered sequence of speakable chunks.
//!
//! ```text
//! raw text ──split_into_sentences──> sentences ──group_sentences_into_chunks──> chunks
//! ```
//!
//! Both stages are pure: the same text and bounds always yield the same
//! chunks. Lengths are measured in Unicode scalar values so accented scripts
//! are not penalized for their UTF-8 width.
//!
//! ## Example
//!
//! ```rust
//! use core_narration::segmenter::{group_sentences_into_chunks, split_into_sentences};
//!
//! let sentences = split_into_sentences("First things first.  Then   the rest!");
//! assert_eq!(sentences, vec!["First things first.", "Then the rest!"]);
//!
//! let chunks = group_sentences_into_chunks(&sentences, 50, 300);
//! assert_eq!(chunks, vec!["First things first. Then the rest!"]);
//! ```

use crate::config::SegmenterConfig;
use crate::error::{NarrationError, Result};

/// Punctuation that ends a sentence when followed by whitespace.
pub const SENTENCE_TERMINALS: [char; 4] = ['.', '!', '?', '…'];

/// Fragments this short or shorter are dropped as noise.
const MAX_NOISE_CHARS: usize = 3;

fn is_terminal(c: char) -> bool {
    SENTENCE_TERMINALS.contains(&c)
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Collapse whitespace runs and split after sentence-terminal punctuation.
///
/// The punctuation stays with the preceding sentence. Fragments of three
/// characters or fewer are discarded.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in normalized.char_indices() {
        if c == ' ' && prev.is_some_and(is_terminal) {
            sentences.push(&normalized[start..i]);
            start = i + 1;
        }
        prev = Some(c);
    }
    sentences.push(&normalized[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| char_len(s) > MAX_NOISE_CHARS)
        .map(str::to_string)
        .collect()
}

/// Greedily pack sentences into chunks.
///
/// A sentence that would push a non-empty buffer past `max_size` flushes the
/// buffer first and starts a new one. Otherwise it is appended, and the
/// buffer is flushed once it reaches `min_size`. Sentences are never split,
/// so one longer than `max_size` becomes a chunk of its own.
pub fn group_sentences_into_chunks<S: AsRef<str>>(
    sentences: &[S],
    min_size: usize,
    max_size: usize,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let sentence = sentence.as_ref();
        let sentence_len = char_len(sentence);

        if !current.is_empty() && current_len + sentence_len > max_size {
            chunks.push(std::mem::replace(&mut current, sentence.to_string()));
            current_len = sentence_len;
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += sentence_len;

        if current_len >= min_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split and group in one step.
///
/// Returns [`NarrationError::EmptyText`] when nothing speakable remains and
/// [`NarrationError::InvalidBounds`] for inverted bounds.
pub fn segment(text: &str, config: &SegmenterConfig) -> Result<Vec<String>> {
    config.validate()?;

    let sentences = split_into_sentences(text);
    if sentences.is_empty() {
        return Err(NarrationError::EmptyText);
    }

    Ok(group_sentences_into_chunks(
        &sentences,
        config.min_size,
        config.max_size,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_after_terminals_followed_by_space() {
        let sentences = split_into_sentences("A short sentence. Another one here! And a third?");
        assert_eq!(
            sentences,
            vec!["A short sentence.", "Another one here!", "And a third?"]
        );
    }

    #[test]
    fn collapses_whitespace_and_newlines() {
        let sentences = split_into_sentences("  Line one.\n\n\tLine   two…  Line three  ");
        assert_eq!(sentences, vec!["Line one.", "Line two…", "Line three"]);
    }

    #[test]
    fn terminal_without_space_does_not_split() {
        let sentences = split_into_sentences("Version 1.5 is out. See example.com now.");
        assert_eq!(sentences, vec!["Version 1.5 is out.", "See example.com now."]);
    }

    #[test]
    fn drops_short_fragments() {
        let sentences = split_into_sentences("Oh. No! Yes, indeed. Ok?");
        assert_eq!(sentences, vec!["Yes, indeed."]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_into_sentences("").is_empty());
        assert!(split_into_sentences("   \n  ").is_empty());
    }

    #[test]
    fn short_sentences_flush_at_min() {
        let sentences = ["A short sentence.", "Another one here!", "And a third?"];
        let chunks = group_sentences_into_chunks(&sentences, 10, 25);
        assert_eq!(
            chunks,
            vec!["A short sentence.", "Another one here!", "And a third?"]
        );
    }

    #[test]
    fn accumulates_until_min_reached() {
        let sentences = ["One two.", "Three four.", "Five six.", "Seven."];
        let chunks = group_sentences_into_chunks(&sentences, 20, 100);
        assert_eq!(chunks, vec!["One two. Three four.", "Five six. Seven."]);
    }

    #[test]
    fn flushes_before_exceeding_max() {
        let sentences = ["Tiny bit.", "A much longer sentence follows."];
        let chunks = group_sentences_into_chunks(&sentences, 100, 30);
        assert_eq!(chunks, vec!["Tiny bit.", "A much longer sentence follows."]);
    }

    #[test]
    fn oversized_sentence_is_kept_whole() {
        let long = "This sentence is far longer than the configured maximum size.";
        let chunks = group_sentences_into_chunks(&[long], 5, 10);
        assert_eq!(chunks, vec![long]);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // 13 + 9 chars fits under 23; the UTF-8 byte lengths would not
        let sentences = ["Xin chào bạn.", "Tạm biệt."];
        let chunks = group_sentences_into_chunks(&sentences, 30, 23);
        assert_eq!(chunks, vec!["Xin chào bạn. Tạm biệt."]);
    }

    #[test]
    fn segment_rejects_empty_text() {
        let err = segment("...", &SegmenterConfig::default()).unwrap_err();
        assert!(matches!(err, NarrationError::EmptyText));
    }

    #[test]
    fn segment_rejects_inverted_bounds() {
        let config = SegmenterConfig {
            min_size: 10,
            max_size: 5,
        };
        assert!(matches!(
            segment("Some text here.", &config),
            Err(NarrationError::InvalidBounds { .. })
        ));
    }
}
