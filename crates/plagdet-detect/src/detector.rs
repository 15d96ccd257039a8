use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use plagdet_core::config::{validate_threshold, Settings};
use plagdet_core::error::{Error, Result};
use plagdet_core::traits::{Embedder, SentenceSplitter, WordTokenizer};
use plagdet_core::types::{CandidateDocument, DetectionResult, DocumentVerdict, TextSpan, UNKNOWN};
use plagdet_text::{chunk_text, normalize, UnicodeSentenceSplitter, UnicodeWordTokenizer};

use crate::aggregate::{document_similarity, Aggregator};
use crate::compare::Comparator;
use crate::vectors::EmbeddingTable;

/// Hybrid semantic/lexical plagiarism detector.
///
/// Cheap to clone; clones share the embedding provider and segmenters.
#[derive(Clone)]
pub struct Detector {
    inner: Arc<Inner>,
}

struct Inner {
    embedder: Arc<dyn Embedder>,
    splitter: Arc<dyn SentenceSplitter>,
    tokenizer: Arc<dyn WordTokenizer>,
    settings: Settings,
}

#[derive(Default)]
pub struct DetectorBuilder {
    embedder: Option<Arc<dyn Embedder>>,
    splitter: Option<Arc<dyn SentenceSplitter>>,
    tokenizer: Option<Arc<dyn WordTokenizer>>,
    settings: Option<Settings>,
}

impl DetectorBuilder {
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn sentence_splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    pub fn word_tokenizer(mut self, tokenizer: Arc<dyn WordTokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<Detector> {
        let embedder = self
            .embedder
            .ok_or_else(|| Error::NotInitialized("no embedding provider attached".into()))?;
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;
        Ok(Detector {
            inner: Arc::new(Inner {
                embedder,
                splitter: self.splitter.unwrap_or_else(|| Arc::new(UnicodeSentenceSplitter)),
                tokenizer: self.tokenizer.unwrap_or_else(|| Arc::new(UnicodeWordTokenizer)),
                settings,
            }),
        })
    }
}

impl Detector {
    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::default()
    }

    /// Detector backed by the embedder the settings select.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = plagdet_embed::default_embedder(&settings.embedding)?;
        Self::builder().embedder(embedder).settings(settings).build()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Compare `source_text` against every usable candidate.
    ///
    /// `min_similarity` overrides the configured threshold for this call. The
    /// scoring runs on a blocking worker and is abandoned once the configured
    /// timeout elapses; no partial result is returned.
    #[instrument(skip_all, fields(candidates = candidates.len(), source_chars = source_text.len()))]
    pub async fn detect(
        &self,
        source_text: &str,
        candidates: &[CandidateDocument],
        min_similarity: Option<f64>,
    ) -> Result<DetectionResult> {
        let threshold = min_similarity.unwrap_or(self.inner.settings.detection.similarity_threshold);
        validate_threshold(threshold)?;

        let started = Instant::now();
        let timeout = self.inner.settings.detection.timeout();
        let cancel = Arc::new(AtomicBool::new(false));

        let inner = Arc::clone(&self.inner);
        let source = source_text.to_string();
        let candidates = candidates.to_vec();
        let worker_cancel = Arc::clone(&cancel);
        let worker = tokio::task::spawn_blocking(move || inner.run(&source, &candidates, threshold, &worker_cancel));

        let mut result = match tokio::time::timeout(timeout, worker).await {
            Ok(Ok(Some(result))) => result,
            Ok(Ok(None)) => return Err(Error::Timeout(timeout)),
            Ok(Err(e)) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Ok(Err(e)) => return Err(Error::Cancelled(format!("detection worker stopped: {e}"))),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(?timeout, "detection timed out");
                return Err(Error::Timeout(timeout));
            }
        };
        result.processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            overall = result.overall_similarity,
            plagiarized = result.is_plagiarized,
            total_matches = result.total_matches,
            skipped = result.skipped_candidates,
            elapsed_ms = result.processing_time_ms,
            "detection complete"
        );
        Ok(result)
    }
}

struct Prepared {
    id: String,
    title: String,
    author: String,
    chunks: Vec<TextSpan>,
}

impl Inner {
    /// The synchronous pipeline. `None` means the run was cancelled.
    fn run(&self, source_text: &str, candidates: &[CandidateDocument], threshold: f64, cancel: &AtomicBool) -> Option<DetectionResult> {
        let detection = &self.settings.detection;
        let source = normalize(source_text);
        if source.is_empty() {
            warn!("source text is empty after normalization; nothing to compare");
            return Some(DetectionResult::empty());
        }
        let source_chunks = chunk_text(&source, detection.chunk_size, self.splitter.as_ref());
        debug!(chunks = source_chunks.len(), "source chunked");

        let mut aggregator = Aggregator::new();
        let mut prepared = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            match accept(index, candidate) {
                Ok((id, content)) => {
                    let chunks = chunk_text(&normalize(content), detection.chunk_size, self.splitter.as_ref());
                    prepared.push(Prepared {
                        id: id.to_string(),
                        title: candidate.title.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                        author: candidate.author.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                        chunks,
                    });
                }
                Err(e) => {
                    debug!(reason = %e, "skipping candidate");
                    aggregator.skip();
                }
            }
        }

        let texts = source_chunks
            .iter()
            .chain(prepared.iter().flat_map(|p| p.chunks.iter()))
            .map(|c| c.text.as_str());
        let table = EmbeddingTable::build(
            self.embedder.as_ref(),
            texts,
            self.settings.embedding.batch_size,
            cancel,
        )?;

        let comparator = Comparator {
            report_threshold: threshold,
            min_exact_match_chars: detection.min_exact_match_chars,
            preview_chars: detection.preview_chars,
            tokenizer: self.tokenizer.as_ref(),
        };

        for candidate in prepared {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let pairs: Vec<(&TextSpan, &TextSpan)> = source_chunks
                .iter()
                .flat_map(|s| candidate.chunks.iter().map(move |t| (s, t)))
                .collect();
            let scored: Vec<_> = pairs
                .into_par_iter()
                .map(|(s, t)| comparator.compare(s, t, table.similarity(&s.text, &t.text)))
                .collect();

            let scores: Vec<f64> = scored.iter().map(|(score, _)| *score).collect();
            let matches: Vec<_> = scored.into_iter().filter_map(|(_, found)| found).collect();
            let similarity = document_similarity(&scores);
            debug!(id = %candidate.id, pairs = scores.len(), similarity, matches = matches.len(), "candidate scored");
            aggregator.push(
                candidate.id,
                DocumentVerdict { similarity, matches, title: candidate.title, author: candidate.author },
            );
        }

        Some(aggregator.finish(threshold, detection.max_matches, detection.match_order))
    }
}

fn accept(index: usize, candidate: &CandidateDocument) -> Result<(&str, &str)> {
    let id = candidate
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::MalformedCandidate(format!("candidate #{index} has no id")))?;
    let content = candidate
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::MalformedCandidate(format!("candidate '{id}' has no content")))?;
    Ok((id, content))
}
