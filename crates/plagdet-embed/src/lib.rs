use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use plagdet_core::config::{expand_path, EmbeddingSettings};
use plagdet_core::error::Error;
use plagdet_core::traits::Embedder;

pub mod device;
mod fake;
pub mod pool;
pub mod similarity;
pub mod tokenize;

pub use fake::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use similarity::{cosine_similarity, semantic_score, semantic_similarity};

pub const MODEL_DIR_ENV: &str = "PLAGDET_MODEL_DIR";
pub const USE_FAKE_ENV: &str = "PLAGDET_USE_FAKE_EMBEDDINGS";
pub const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

/// BERT-family sentence encoder (MiniLM by default) with masked mean
/// pooling and L2-normalized output.
pub struct EmbeddingModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl EmbeddingModel {
    /// Load `tokenizer.json`, `config.json` and weights from `model_dir`.
    ///
    /// Weights are read from `model.safetensors` when present, otherwise
    /// from `pytorch_model.bin`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        info!(dim, max_len, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let batch = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let hidden = self
            .model
            .forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        if vectors.iter().any(|v| v.len() != self.dim) {
            bail!("model produced vectors of unexpected dimension (expected {})", self.dim);
        }
        debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(vectors)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode(texts)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!(path = %safetensors.display(), "reading safetensors weights");
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        debug!(path = %pickle.display(), "reading pytorch weights");
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    bail!("no model.safetensors or pytorch_model.bin in {}", model_dir.display())
}

/// Build the embedder selected by settings.
///
/// `use_fake` (or `PLAGDET_USE_FAKE_EMBEDDINGS=1`) picks the hashing
/// embedder; otherwise the local model is loaded.
pub fn default_embedder(settings: &EmbeddingSettings) -> plagdet_core::error::Result<Arc<dyn Embedder>> {
    let env_fake = std::env::var(USE_FAKE_ENV)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if settings.use_fake || env_fake {
        info!(dim = settings.fake_dim, "using hashing embedder");
        return Ok(Arc::new(HashingEmbedder::new(settings.fake_dim)));
    }
    let dir = resolve_model_dir(settings).map_err(|e| Error::Model(format!("{e:#}")))?;
    let model = EmbeddingModel::load(&dir, settings.max_len).map_err(|e| Error::Model(format!("{e:#}")))?;
    Ok(Arc::new(model))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if let Some(dir) = &settings.model_dir {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        warn!(dir = %p.display(), "configured embedding.model_dir does not exist");
    }
    if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
        let p = expand_path(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let fallback = Path::new(DEFAULT_MODEL_DIR);
    if fallback.exists() {
        return Ok(fallback.to_path_buf());
    }
    Err(anyhow!("Could not locate a sentence embedding model directory (set embedding.model_dir or {MODEL_DIR_ENV})"))
}
