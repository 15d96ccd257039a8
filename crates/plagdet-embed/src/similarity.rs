//! Cosine scoring over embedding vectors.

use tracing::warn;

use plagdet_core::traits::Embedder;

/// Cosine similarity in `[-1, 1]`.
///
/// `None` when the vectors differ in length, are empty, or either has zero
/// magnitude. Identical non-zero vectors score exactly 1.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if !denom.is_finite() || denom < f64::EPSILON {
        return None;
    }
    if a == b {
        return Some(1.0);
    }
    Some((dot / denom).clamp(-1.0, 1.0))
}

/// Domain score for a pair of optional embeddings.
///
/// Missing vectors and degenerate cosines score 0.0; anti-correlation is
/// treated as unrelated, not as more dissimilar.
pub fn semantic_score(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => cosine_similarity(a, b).map_or(0.0, |c| c.clamp(0.0, 1.0)),
        _ => 0.0,
    }
}

/// Embed two spans and score them. Provider failures are logged and score 0.0.
pub fn semantic_similarity(a: &str, b: &str, embedder: &dyn Embedder) -> f64 {
    let texts = if a == b { vec![a.to_string()] } else { vec![a.to_string(), b.to_string()] };
    match embedder.embed_batch(&texts) {
        Ok(vectors) if vectors.len() == texts.len() => {
            // identical text, one successful embedding: identity holds even
            // for a zero vector
            if a == b && vectors.first().is_some_and(|v| !v.is_empty()) {
                return 1.0;
            }
            let va = vectors.first().map(Vec::as_slice);
            let vb = vectors.last().map(Vec::as_slice);
            semantic_score(va, vb)
        }
        Ok(vectors) => {
            warn!(expected = texts.len(), got = vectors.len(), "embedding provider returned wrong number of vectors");
            0.0
        }
        Err(e) => {
            warn!(error = %e, "embedding provider failed, scoring pair as 0.0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_basics() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), Some(-1.0));
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn identical_text_with_zero_vector_is_one() {
        let e = crate::HashingEmbedder::new(16);
        assert_eq!(semantic_similarity("— … !!! ??? ***", "— … !!! ??? ***", &e), 1.0);
        assert_eq!(semantic_similarity("", "", &e), 1.0);
    }

    #[test]
    fn negative_cosine_scores_zero() {
        assert_eq!(semantic_score(Some(&[1.0, 0.0]), Some(&[-1.0, 0.0])), 0.0);
        assert_eq!(semantic_score(None, Some(&[1.0, 0.0])), 0.0);
    }
}
