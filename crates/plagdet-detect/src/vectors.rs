//! One embedding per distinct chunk text for a whole detection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use plagdet_core::error::Error;
use plagdet_core::traits::Embedder;
use plagdet_embed::semantic_score;

/// Deduplicated chunk embeddings, filled in batches.
///
/// A slot with no vector means the provider failed for that text; every pair
/// touching it scores 0.0 semantically.
#[derive(Debug, Default)]
pub struct EmbeddingTable {
    slots: HashMap<String, usize>,
    vectors: Vec<Option<Vec<f32>>>,
}

impl EmbeddingTable {
    /// Embed every distinct text in `texts`, `batch_size` at a time.
    ///
    /// Returns `None` if `cancel` is raised between batches.
    pub fn build<'a, I>(embedder: &dyn Embedder, texts: I, batch_size: usize, cancel: &AtomicBool) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut slots = HashMap::new();
        let mut distinct: Vec<String> = Vec::new();
        for text in texts {
            if !slots.contains_key(text) {
                slots.insert(text.to_string(), distinct.len());
                distinct.push(text.to_string());
            }
        }

        let dim = embedder.dim();
        let mut vectors = Vec::with_capacity(distinct.len());
        for batch in distinct.chunks(batch_size.max(1)) {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            vectors.extend(embed_or_fallback(embedder, batch, dim));
        }

        let missing = vectors.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            warn!(missing, total = vectors.len(), "some chunks have no embedding; their pairs score 0.0");
        }
        debug!(distinct = vectors.len(), "embedding table ready");
        Some(Self { slots, vectors })
    }

    pub fn get(&self, text: &str) -> Option<&[f32]> {
        self.slots
            .get(text)
            .and_then(|&slot| self.vectors.get(slot))
            .and_then(|v| v.as_deref())
    }

    /// Semantic similarity in `[0, 1]` between two embedded texts.
    ///
    /// Texts sharing an embedded slot score 1.0, zero vector included; only a
    /// missing embedding scores 0.0.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b && self.get(a).is_some() {
            return 1.0;
        }
        semantic_score(self.get(a), self.get(b))
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn embed_or_fallback(embedder: &dyn Embedder, batch: &[String], dim: usize) -> Vec<Option<Vec<f32>>> {
    match embedder.embed_batch(batch) {
        Ok(vectors) if vectors.len() == batch.len() => vectors.into_iter().map(|v| valid(v, dim)).collect(),
        outcome => {
            match outcome {
                Ok(vectors) => warn!(expected = batch.len(), got = vectors.len(), "batch returned wrong number of vectors, retrying per text"),
                Err(e) => warn!(error = %Error::Provider(format!("{e:#}")), size = batch.len(), "batch embedding failed, retrying per text"),
            }
            batch
                .iter()
                .map(|text| match embedder.embed_batch(std::slice::from_ref(text)) {
                    Ok(mut one) if one.len() == 1 => valid(one.remove(0), dim),
                    Ok(_) => None,
                    Err(e) => {
                        debug!(error = %e, "embedding failed for one chunk");
                        None
                    }
                })
                .collect()
        }
    }
}

fn valid(v: Vec<f32>, dim: usize) -> Option<Vec<f32>> {
    (!v.is_empty() && v.len() == dim && v.iter().all(|x| x.is_finite())).then_some(v)
}
