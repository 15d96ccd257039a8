use std::ops::Range;

/// Maps text spans to fixed-length vectors.
///
/// Implementations must be safe to share across concurrent detections and
/// should return one vector per input, all of length `dim()`.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Sentence boundary detection.
///
/// Returns byte ranges into `text`, in order and non-overlapping.
pub trait SentenceSplitter: Send + Sync {
    fn sentence_spans(&self, text: &str) -> Vec<Range<usize>>;
}

/// A word token with its byte range in the tokenized text.
///
/// `text` is the case-folded form used for comparison; `start..end`
/// always points at the original spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

pub trait WordTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}
