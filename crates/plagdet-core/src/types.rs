//! Domain types shared by the text, embedding and detection crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DocId = String;

pub const UNKNOWN: &str = "Unknown";
pub const DETECTION_METHOD: &str = "hybrid_semantic_lexical";

/// A contiguous, sentence-aligned slice of a normalized document.
///
/// - `text`: the trimmed chunk payload
/// - `start_offset`/`end_offset`: character offsets into the normalized text,
///   so `end_offset - start_offset == text.chars().count()`
/// - `sequence_id`: position of the chunk within its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub sequence_id: usize,
}

/// Which signal produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Semantic,
}

/// A literal overlapping word run found inside a chunk pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactSpan {
    pub source_start: usize,
    pub source_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub matched_text: String,
    pub score: f64,
    pub match_kind: MatchKind,
}

impl ExactSpan {
    /// Shift span-relative offsets into document coordinates.
    #[must_use]
    pub fn offset_by(mut self, source_base: usize, target_base: usize) -> Self {
        self.source_start += source_base;
        self.source_end += source_base;
        self.target_start += target_base;
        self.target_end += target_base;
        self
    }
}

/// A chunk pair whose combined score cleared the reporting threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub source_start: usize,
    pub source_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub matched_text: String,
    pub score: f64,
    pub match_kind: MatchKind,
    pub sub_matches: Vec<ExactSpan>,
}

/// A document to compare the source against. Read-only to the engine.
///
/// Every field is optional on the wire; candidates without `id` or
/// `content` are skipped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDocument {
    #[serde(default)]
    pub id: Option<DocId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CandidateDocument {
    pub fn new(id: impl Into<DocId>, content: impl Into<String>) -> Self {
        Self { id: Some(id.into()), content: Some(content.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVerdict {
    pub similarity: f64,
    pub matches: Vec<SimilarityMatch>,
    pub title: String,
    pub author: String,
}

/// Outcome of one detection call.
///
/// `matches` is capped; `total_matches` counts every match produced before
/// the cap was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub overall_similarity: f64,
    pub is_plagiarized: bool,
    pub confidence: f64,
    pub total_matches: usize,
    pub per_document: BTreeMap<DocId, DocumentVerdict>,
    pub matches: Vec<SimilarityMatch>,
    pub detection_method: String,
    pub processing_time_ms: u64,
    pub skipped_candidates: usize,
}

impl DetectionResult {
    /// The "ran, found nothing" result.
    pub fn empty() -> Self {
        Self {
            overall_similarity: 0.0,
            is_plagiarized: false,
            confidence: 0.0,
            total_matches: 0,
            per_document: BTreeMap::new(),
            matches: Vec::new(),
            detection_method: DETECTION_METHOD.to_string(),
            processing_time_ms: 0,
            skipped_candidates: 0,
        }
    }
}
