//! Chunk-pair scoring.

use plagdet_core::traits::{Embedder, WordTokenizer};
use plagdet_core::types::{MatchKind, SimilarityMatch, TextSpan};
use plagdet_embed::semantic_similarity;
use plagdet_text::{find_exact_matches, lexical_similarity};

const SEMANTIC_WEIGHT: f64 = 0.7;
const LEXICAL_WEIGHT: f64 = 0.3;

/// Scoring parameters shared by every pair in one detection.
pub struct Comparator<'a> {
    pub report_threshold: f64,
    pub min_exact_match_chars: usize,
    pub preview_chars: usize,
    pub tokenizer: &'a dyn WordTokenizer,
}

impl Comparator<'_> {
    /// Blend a precomputed semantic score with the pair's lexical score.
    ///
    /// Pairs at or above the report threshold also yield a match carrying
    /// every exact sub-span, in document coordinates.
    pub fn compare(&self, source: &TextSpan, target: &TextSpan, semantic: f64) -> (f64, Option<SimilarityMatch>) {
        let lexical = lexical_similarity(&source.text, &target.text);
        let combined = (SEMANTIC_WEIGHT * semantic + LEXICAL_WEIGHT * lexical).clamp(0.0, 1.0);
        if combined < self.report_threshold {
            return (combined, None);
        }

        let sub_matches = find_exact_matches(&source.text, &target.text, self.min_exact_match_chars, self.tokenizer)
            .into_iter()
            .map(|span| span.offset_by(source.start_offset, target.start_offset))
            .collect();
        let found = SimilarityMatch {
            source_start: source.start_offset,
            source_end: source.end_offset,
            target_start: target.start_offset,
            target_end: target.end_offset,
            matched_text: preview(&source.text, self.preview_chars),
            score: combined,
            match_kind: MatchKind::Semantic,
            sub_matches,
        };
        (combined, Some(found))
    }

    /// Score a single pair against a provider directly, without a shared
    /// embedding table.
    pub fn compare_with(
        &self,
        source: &TextSpan,
        target: &TextSpan,
        embedder: &dyn Embedder,
    ) -> (f64, Option<SimilarityMatch>) {
        let semantic = semantic_similarity(&source.text, &target.text, embedder);
        self.compare(source, target, semantic)
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plagdet_embed::HashingEmbedder;
    use plagdet_text::UnicodeWordTokenizer;

    fn span(text: &str, start: usize) -> TextSpan {
        TextSpan { text: text.into(), start_offset: start, end_offset: start + text.chars().count(), sequence_id: 0 }
    }

    fn comparator(threshold: f64) -> Comparator<'static> {
        Comparator { report_threshold: threshold, min_exact_match_chars: 40, preview_chars: 200, tokenizer: &UnicodeWordTokenizer }
    }

    #[test]
    fn identical_pair_scores_one_with_shifted_sub_match() {
        let text = "The mitochondria is the powerhouse of the cell.";
        let (score, found) = comparator(0.8).compare_with(&span(text, 10), &span(text, 100), &HashingEmbedder::new(64));
        assert_eq!(score, 1.0);
        let found = found.expect("match");
        assert_eq!(found.match_kind, MatchKind::Semantic);
        assert_eq!(found.sub_matches.len(), 1);
        assert_eq!(found.sub_matches[0].source_start, 10);
        assert_eq!(found.sub_matches[0].target_start, 100);
        assert_eq!(found.sub_matches[0].target_end, 100 + text.chars().count());
    }

    #[test]
    fn below_threshold_still_scores() {
        let (score, found) = comparator(0.8).compare(&span("abc", 0), &span("xyz", 0), 0.5);
        assert!((score - 0.35).abs() < 1e-12);
        assert!(found.is_none());
    }

    #[test]
    fn semantic_only_match_has_no_sub_matches() {
        let (_, found) = comparator(0.5).compare(&span("cells make energy", 0), &span("energy from cells", 0), 1.0);
        let found = found.expect("match");
        assert!(found.sub_matches.is_empty());
    }

    #[test]
    fn long_source_text_is_previewed() {
        let long = "é".repeat(250);
        let (_, found) = comparator(0.0).compare(&span(&long, 0), &span("x", 0), 0.0);
        let text = found.expect("match").matched_text;
        assert_eq!(text.chars().count(), 203);
        assert!(text.ends_with("..."));
    }
}
