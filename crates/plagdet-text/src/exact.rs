//! Literal phrase extraction between two spans.

use plagdet_core::traits::{Token, WordTokenizer};
use plagdet_core::types::{ExactSpan, MatchKind};

use crate::blocks::matching_blocks;
use crate::segment::char_offset;

/// Every aligned word run between `a` and `b` that is long enough to count
/// as copied text.
///
/// A run qualifies when it has more than `min_length_chars / 5` tokens and
/// its source text spans at least `min_length_chars` characters. Offsets
/// are char offsets into `a` and `b`, taken from the tokenizer's byte
/// ranges, so punctuation and spacing inside the run are preserved in
/// `matched_text`.
pub fn find_exact_matches(
    a: &str,
    b: &str,
    min_length_chars: usize,
    tokenizer: &dyn WordTokenizer,
) -> Vec<ExactSpan> {
    let tokens_a = tokenizer.tokenize(a);
    let tokens_b = tokenizer.tokenize(b);
    let keys_a: Vec<&str> = tokens_a.iter().map(|t| t.text.as_str()).collect();
    let keys_b: Vec<&str> = tokens_b.iter().map(|t| t.text.as_str()).collect();
    let min_tokens = min_length_chars / 5;

    matching_blocks(&keys_a, &keys_b)
        .into_iter()
        .filter(|block| block.size > min_tokens)
        .filter_map(|block| {
            let (src_start, src_end) = byte_span(&tokens_a[block.a..block.a + block.size]);
            let (tgt_start, tgt_end) = byte_span(&tokens_b[block.b..block.b + block.size]);
            let matched = &a[src_start..src_end];
            let matched_chars = matched.chars().count();
            if matched_chars < min_length_chars {
                return None;
            }
            let source_start = char_offset(a, src_start);
            let target_start = char_offset(b, tgt_start);
            Some(ExactSpan {
                source_start,
                source_end: source_start + matched_chars,
                target_start,
                target_end: target_start + b[tgt_start..tgt_end].chars().count(),
                matched_text: matched.to_string(),
                score: 1.0,
                match_kind: MatchKind::Exact,
            })
        })
        .collect()
}

fn byte_span(run: &[Token]) -> (usize, usize) {
    match (run.first(), run.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => (0, 0),
    }
}
