//! UAX #29 sentence and word segmentation.

use std::ops::Range;

use plagdet_core::traits::{SentenceSplitter, Token, WordTokenizer};
use unicode_segmentation::UnicodeSegmentation;

/// Sentence splitter over Unicode sentence boundaries.
///
/// Each sentence keeps its trailing whitespace, so the returned ranges tile
/// the whole input.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn sentence_spans(&self, text: &str) -> Vec<Range<usize>> {
        text.split_sentence_bound_indices().map(|(start, s)| start..start + s.len()).collect()
    }
}

/// Word tokenizer over Unicode word boundaries. Punctuation marks are kept
/// as their own tokens, whitespace is dropped and tokens are lowercased.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeWordTokenizer;

impl WordTokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.split_word_bound_indices()
            .filter(|(_, w)| !w.trim().is_empty())
            .map(|(start, w)| Token { text: w.to_lowercase(), start, end: start + w.len() })
            .collect()
    }
}

/// Number of chars in `text[..byte_idx]`.
pub(crate) fn char_offset(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count()
}
