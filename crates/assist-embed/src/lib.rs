//! Embedding provider for the answer pipeline.
//!
//! Maps text to a fixed-dimension unit-norm vector with a local BERT
//! checkpoint (bge-small by default). The same provider runs at index build
//! time and query time; the index manifest pins its identity.

pub mod device;
pub mod pool;
pub mod tokenize;
pub mod weights;

use anyhow::{anyhow, bail, Result};
use candle_core::Device;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use std::path::PathBuf;
use tokenizers::Tokenizer;
use tracing::info;

use assist_core::config::{expand_path, EmbeddingSettings};
pub use assist_core::traits::Embedder;

/// BERT encoder with masked mean pooling and L2 normalization.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl BertEmbedder {
    /// Load tokenizer, config and weights from the configured model
    /// directory (tokenizer.json, config.json, model.safetensors or
    /// pytorch_model.bin).
    pub fn load(settings: &EmbeddingSettings) -> Result<Self> {
        let device = device::select_device();
        let model_dir = resolve_model_dir(&settings.model_dir)?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let vb = weights::load_weights(&model_dir, DTYPE, &device)?;
        let model = BertModel::load(vb, &config)?;
        info!(model = %settings.model_id, dim = settings.dim, "embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            dim: settings.dim,
            max_len: settings.max_len,
        })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize::encode_single(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = pool::masked_mean_l2(&hidden, &attention_mask)?;
        let embedding: Vec<f32> = pooled.squeeze(0)?.to_device(&Device::Cpu)?.to_vec1()?;
        if embedding.len() != self.dim {
            bail!(
                "embedding dim mismatch: model produced {}, configuration says {}",
                embedding.len(),
                self.dim
            );
        }
        Ok(embedding)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }
}

/// Deterministic hash-based embedder for tests and offline development.
/// Unit-normalized like the real provider, with no model files required.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

/// The provider the rest of the pipeline should use. Set
/// `APP_USE_FAKE_EMBEDDINGS=1` to skip model loading entirely.
pub fn default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        info!(dim = settings.dim, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dim)));
    }
    Ok(Box::new(BertEmbedder::load(settings)?))
}

fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    let dir = expand_path(configured);
    if !dir.exists() {
        bail!("embedding model directory not found: {}", dir.display());
    }
    Ok(dir)
}
