//! Per-document and cross-document rollup.

use std::collections::BTreeMap;

use plagdet_core::config::MatchOrder;
use plagdet_core::types::{DetectionResult, DocId, DocumentVerdict, SimilarityMatch, DETECTION_METHOD};

const MAX_WEIGHT: f64 = 0.6;
const AVG_WEIGHT: f64 = 0.4;
const CONFIDENCE_BOOST: f64 = 1.2;

/// `0.6 * max + 0.4 * mean` over a candidate's pairwise combined scores.
/// A candidate that produced no pairs scores 0.0.
pub fn document_similarity(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let max = scores.iter().copied().fold(0.0f64, f64::max);
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    (MAX_WEIGHT * max + AVG_WEIGHT * avg).clamp(0.0, 1.0)
}

pub fn confidence(overall_similarity: f64) -> f64 {
    (overall_similarity * CONFIDENCE_BOOST).min(1.0)
}

/// Collects verdicts in candidate order and produces the final result.
#[derive(Debug, Default)]
pub struct Aggregator {
    per_document: BTreeMap<DocId, DocumentVerdict>,
    matches: Vec<SimilarityMatch>,
    skipped: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one candidate. A repeated id replaces the earlier verdict;
    /// matches from both stay in the accumulated list.
    pub fn push(&mut self, id: DocId, verdict: DocumentVerdict) {
        self.matches.extend(verdict.matches.iter().cloned());
        self.per_document.insert(id, verdict);
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn finish(self, threshold: f64, max_matches: usize, order: MatchOrder) -> DetectionResult {
        let overall_similarity = self
            .per_document
            .values()
            .map(|v| v.similarity)
            .fold(0.0f64, f64::max);
        let total_matches = self.matches.len();
        let mut matches = self.matches;
        if order == MatchOrder::Ranked {
            matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        matches.truncate(max_matches);

        DetectionResult {
            overall_similarity,
            is_plagiarized: overall_similarity >= threshold,
            confidence: confidence(overall_similarity),
            total_matches,
            per_document: self.per_document,
            matches,
            detection_method: DETECTION_METHOD.to_string(),
            processing_time_ms: 0,
            skipped_candidates: self.skipped,
        }
    }
}
