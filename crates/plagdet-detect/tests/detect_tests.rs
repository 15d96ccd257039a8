use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use plagdet_core::config::{MatchOrder, Settings};
use plagdet_core::error::Error;
use plagdet_core::traits::Embedder;
use plagdet_core::types::{CandidateDocument, MatchKind};
use plagdet_detect::{confidence, Detector};
use plagdet_embed::HashingEmbedder;
use proptest::prelude::*;

const MITO: &str = "The mitochondria is the powerhouse of the cell.";

/// One dimension per distinct lowercase word, so documents with disjoint
/// vocabularies are exactly orthogonal.
struct VocabEmbedder {
    vocab: Mutex<HashMap<String, usize>>,
    dim: usize,
}

impl VocabEmbedder {
    fn new(dim: usize) -> Self {
        Self { vocab: Mutex::new(HashMap::new()), dim }
    }
}

impl Embedder for VocabEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }
    fn max_len(&self) -> usize {
        usize::MAX
    }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut vocab = self.vocab.lock().unwrap();
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0f32; self.dim];
                for w in t.split(|c: char| !c.is_alphabetic()).filter(|w| !w.is_empty()) {
                    let next = vocab.len();
                    let idx = *vocab.entry(w.to_lowercase()).or_insert(next);
                    v[idx % self.dim] += 1.0;
                }
                v
            })
            .collect())
    }
}

fn detector_with(embedder: Arc<dyn Embedder>) -> Detector {
    Detector::builder().embedder(embedder).build().expect("detector")
}

fn hashing_detector() -> Detector {
    detector_with(Arc::new(HashingEmbedder::new(384)))
}

fn words(n: usize, alphabet: &[u8], seed: usize) -> String {
    let base = alphabet.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let mut k = i * 7 + seed + base * base;
        let mut w = String::new();
        while k > 0 {
            w.push(alphabet[k % base] as char);
            k /= base;
        }
        out.push(if i % 12 == 11 { format!("{w}.") } else { w });
    }
    out.join(" ")
}

#[test]
fn build_without_embedder_is_not_initialized() {
    let err = Detector::builder().build().err().expect("must fail");
    assert!(matches!(err, Error::NotInitialized(_)));
    assert!(err.is_unavailable());
}

#[test]
fn build_rejects_invalid_settings() {
    let mut settings = Settings::default();
    settings.detection.chunk_size = 0;
    let err = Detector::builder()
        .embedder(Arc::new(HashingEmbedder::new(8)))
        .settings(settings)
        .build()
        .err()
        .expect("must fail");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[tokio::test]
async fn identical_sentence_is_full_match() {
    let candidates = vec![CandidateDocument::new("doc-1", MITO).with_title("Biology 101")];
    let r = hashing_detector().detect(MITO, &candidates, None).await.expect("detect");

    let verdict = &r.per_document["doc-1"];
    assert_eq!(verdict.similarity, 1.0);
    assert_eq!(verdict.title, "Biology 101");
    assert_eq!(verdict.author, "Unknown");
    assert_eq!(r.overall_similarity, 1.0);
    assert!(r.is_plagiarized);
    assert_eq!(r.confidence, 1.0);
    assert_eq!(r.total_matches, 1);
    assert_eq!(r.detection_method, "hybrid_semantic_lexical");

    let m = &r.matches[0];
    assert_eq!(m.match_kind, MatchKind::Semantic);
    assert_eq!(m.matched_text, MITO);
    assert_eq!(m.sub_matches.len(), 1);
    let exact = &m.sub_matches[0];
    assert_eq!(exact.match_kind, MatchKind::Exact);
    assert_eq!((exact.source_start, exact.source_end), (0, MITO.chars().count()));
    assert_eq!(exact.matched_text, MITO);
}

#[tokio::test]
async fn identical_document_is_plagiarized_at_max_threshold() {
    let candidates = vec![CandidateDocument::new("same", MITO)];
    let r = hashing_detector().detect(MITO, &candidates, Some(1.0)).await.expect("detect");
    assert!(r.is_plagiarized);
}

#[tokio::test]
async fn identical_punctuation_only_document_is_plagiarized() {
    let text = "— … !!! ??? ***";
    let candidates = vec![CandidateDocument::new("same", text)];
    let r = hashing_detector().detect(text, &candidates, Some(1.0)).await.expect("detect");
    assert_eq!(r.per_document["same"].similarity, 1.0);
    assert!(r.is_plagiarized);
}

#[tokio::test]
async fn unrelated_documents_score_near_zero() {
    let source = words(500, b"abcdefghijklm", 1);
    let other = words(500, b"nopqrstuvwxyz", 3);
    let candidates = vec![CandidateDocument::new("other", other)];
    let r = detector_with(Arc::new(VocabEmbedder::new(4096)))
        .detect(&source, &candidates, None)
        .await
        .expect("detect");

    let similarity = r.per_document["other"].similarity;
    assert!(similarity < 0.2, "similarity {similarity}");
    assert!(r.matches.is_empty());
    assert_eq!(r.total_matches, 0);
    assert!(!r.is_plagiarized);
}

#[tokio::test]
async fn overall_is_max_across_candidates() {
    let unrelated = "Glaciers carve valleys over many thousands of years.";
    let candidates = vec![
        CandidateDocument::new("low", unrelated),
        CandidateDocument::new("high", MITO),
    ];
    let r = detector_with(Arc::new(VocabEmbedder::new(256)))
        .detect(MITO, &candidates, None)
        .await
        .expect("detect");
    let low = r.per_document["low"].similarity;
    let high = r.per_document["high"].similarity;
    assert!(low < high);
    assert_eq!(r.overall_similarity, high);
    assert_eq!(r.overall_similarity, 1.0);
}

#[tokio::test]
async fn malformed_candidates_are_skipped() {
    let candidates = vec![
        CandidateDocument::new("empty", ""),
        CandidateDocument::new("blank", "   \n "),
        CandidateDocument { id: None, content: Some(MITO.into()), ..Default::default() },
        CandidateDocument { id: Some("no-content".into()), ..Default::default() },
        CandidateDocument::new("ok", MITO),
    ];
    let r = hashing_detector().detect(MITO, &candidates, None).await.expect("detect");
    assert_eq!(r.per_document.keys().collect::<Vec<_>>(), vec!["ok"]);
    assert_eq!(r.skipped_candidates, 4);
}

#[tokio::test]
async fn empty_source_yields_empty_result() {
    let candidates = vec![CandidateDocument::new("ok", MITO)];
    let r = hashing_detector().detect("  [12]  ", &candidates, None).await.expect("detect");
    assert_eq!(r.overall_similarity, 0.0);
    assert!(r.per_document.is_empty());
    assert!(r.matches.is_empty());
}

#[tokio::test]
async fn no_candidates_is_zero() {
    let r = hashing_detector().detect(MITO, &[], None).await.expect("detect");
    assert_eq!(r.overall_similarity, 0.0);
    assert!(!r.is_plagiarized);
}

#[tokio::test]
async fn invalid_threshold_is_rejected() {
    let err = hashing_detector().detect(MITO, &[], Some(1.5)).await.err().expect("must fail");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[tokio::test]
async fn provider_failure_degrades_to_lexical_only() {
    struct Down;
    impl Embedder for Down {
        fn dim(&self) -> usize {
            8
        }
        fn max_len(&self) -> usize {
            64
        }
        fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("provider offline")
        }
    }
    let candidates = vec![CandidateDocument::new("doc", MITO)];
    let r = detector_with(Arc::new(Down)).detect(MITO, &candidates, None).await.expect("detect");
    // lexical 1.0 weighted at 0.3, semantic 0.0
    assert!((r.per_document["doc"].similarity - 0.3).abs() < 1e-9);
    assert!(r.matches.is_empty());
}

#[tokio::test]
async fn match_list_is_capped_in_accumulation_order() {
    let mut settings = Settings::default();
    settings.detection.max_matches = 2;
    settings.detection.match_order = MatchOrder::Accumulation;
    let detector = Detector::builder()
        .embedder(Arc::new(HashingEmbedder::new(64)))
        .settings(settings)
        .build()
        .expect("detector");
    let candidates: Vec<_> = ["c", "a", "b"].iter().map(|id| CandidateDocument::new(*id, MITO)).collect();
    let r = detector.detect(MITO, &candidates, None).await.expect("detect");
    assert_eq!(r.total_matches, 3);
    assert_eq!(r.matches.len(), 2);
    let json = serde_json::to_value(&r).expect("json");
    assert_eq!(json["per_document"].as_object().map(|o| o.len()), Some(3));
}

#[tokio::test]
async fn slow_provider_times_out() {
    struct Slow;
    impl Embedder for Slow {
        fn dim(&self) -> usize {
            4
        }
        fn max_len(&self) -> usize {
            64
        }
        fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(texts.iter().map(|_| vec![1.0; 4]).collect())
        }
    }
    let mut settings = Settings::default();
    settings.detection.timeout_secs = 1;
    let detector = Detector::builder().embedder(Arc::new(Slow)).settings(settings).build().expect("detector");
    let err = detector
        .detect(MITO, &[CandidateDocument::new("doc", MITO)], None)
        .await
        .err()
        .expect("must time out");
    assert!(matches!(err, Error::Timeout(_)));
}

#[tokio::test]
#[should_panic(expected = "embedder exploded")]
async fn worker_panic_propagates_to_caller() {
    struct Exploding;
    impl Embedder for Exploding {
        fn dim(&self) -> usize {
            4
        }
        fn max_len(&self) -> usize {
            64
        }
        fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            panic!("embedder exploded")
        }
    }
    let _ = detector_with(Arc::new(Exploding)).detect(MITO, &[CandidateDocument::new("doc", MITO)], None).await;
}

#[tokio::test]
async fn detectors_are_shareable_across_tasks() {
    let detector = hashing_detector();
    let mut handles = Vec::new();
    for i in 0..4 {
        let d = detector.clone();
        handles.push(tokio::spawn(async move {
            let candidates = vec![CandidateDocument::new(format!("doc-{i}"), MITO)];
            d.detect(MITO, &candidates, None).await
        }));
    }
    for h in handles {
        let r = h.await.expect("join").expect("detect");
        assert_eq!(r.overall_similarity, 1.0);
    }
}

proptest! {
    #[test]
    fn confidence_bounds(overall in 0.0f64..=1.0) {
        let c = confidence(overall);
        prop_assert!((0.0..=1.0).contains(&c));
        if overall <= 1.0 / 1.2 {
            prop_assert!(c >= overall);
        }
    }
}
