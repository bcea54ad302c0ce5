//! Relevance reranking of retrieved candidates.
//!
//! First-pass embedding similarity is cheap but imprecise. The cross-encoder
//! rescans the small candidate set with full query-document cross-attention,
//! which cannot be decomposed into separate query/document vectors, and
//! keeps only the top N for generation.

use anyhow::{anyhow, bail, Result};
use candle_core::Device;
use candle_nn::{Linear, Module};
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;
use tracing::info;

use assist_core::config::{expand_path, RerankerSettings};
use assist_core::types::{Candidate, RankedCandidate};
pub use assist_core::traits::Reranker;
use assist_embed::{device::select_device, tokenize, weights};

/// BERT sequence-classification head scoring each (query, passage) pair.
pub struct CrossEncoderReranker {
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl CrossEncoderReranker {
    pub fn load(settings: &RerankerSettings) -> Result<Self> {
        let device = select_device();
        let model_dir = expand_path(&settings.model_dir);
        if !model_dir.exists() {
            bail!("reranker model directory not found: {}", model_dir.display());
        }

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        // Sequence-classification checkpoints prefix the encoder with
        // "bert." and carry the pooler and classifier at the top level.
        let vb = weights::load_weights(&model_dir, DTYPE, &device)?;
        let model = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = candle_nn::linear(
            config.hidden_size,
            config.hidden_size,
            vb.pp("bert.pooler.dense"),
        )?;
        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;
        info!(model = %settings.model_id, "reranker model loaded");

        Ok(Self {
            model,
            pooler,
            classifier,
            tokenizer,
            device,
            max_len: settings.max_len,
        })
    }

    /// Relevance logit for one (query, passage) pair. Higher is better; the
    /// score space is unrelated to embedding similarity.
    fn score_pair(&self, query: &str, passage: &str) -> Result<f32> {
        let (input_ids, token_type_ids, attention_mask) =
            tokenize::encode_pair(&self.tokenizer, query, passage, self.max_len, &self.device)?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logit = self.classifier.forward(&pooled)?;
        let score = logit.squeeze(1)?.squeeze(0)?.to_scalar::<f32>()?;
        Ok(score)
    }
}

impl Reranker for CrossEncoderReranker {
    fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_n: usize,
    ) -> Result<Vec<RankedCandidate>> {
        let mut ranked = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let relevance_score = self.score_pair(query, &candidate.chunk.text)?;
            ranked.push(RankedCandidate { chunk: candidate.chunk, relevance_score });
        }
        Ok(sort_and_truncate(ranked, top_n))
    }
}

/// Query-term-overlap reranker for tests and offline use. Same ordering
/// contract as the cross-encoder, no model files required.
pub struct LexicalReranker;

impl Reranker for LexicalReranker {
    fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_n: usize,
    ) -> Result<Vec<RankedCandidate>> {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();

        let mut ranked = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let content_lower = candidate.chunk.text.to_lowercase();
            let mut hits = 0.0f32;
            for word in &query_words {
                if content_lower.contains(word) {
                    hits += 1.0;
                }
            }
            let relevance_score = if query_words.is_empty() {
                0.0
            } else {
                hits / query_words.len() as f32
            };
            ranked.push(RankedCandidate { chunk: candidate.chunk, relevance_score });
        }
        Ok(sort_and_truncate(ranked, top_n))
    }
}

/// Descending stable sort, then truncate to `top_n`. Stability preserves the
/// input candidate order for equal scores.
fn sort_and_truncate(mut ranked: Vec<RankedCandidate>, top_n: usize) -> Vec<RankedCandidate> {
    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_n);
    ranked
}

/// The reranker the pipeline should use. Set `APP_USE_LEXICAL_RERANKER=1`
/// to skip model loading entirely.
pub fn default_reranker(settings: &RerankerSettings) -> Result<Box<dyn Reranker>> {
    let use_lexical = std::env::var("APP_USE_LEXICAL_RERANKER")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_lexical {
        info!("using lexical reranker");
        return Ok(Box::new(LexicalReranker));
    }
    Ok(Box::new(CrossEncoderReranker::load(settings)?))
}
