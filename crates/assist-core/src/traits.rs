//! Seams between the pipeline stages. Each stage is independently fallible
//! and independently replaceable; tests stub these traits directly.

use crate::error::{GenerationError, TranslationError};
use crate::types::{Candidate, RankedCandidate};
use async_trait::async_trait;

/// Maps text to a fixed-dimension dense vector, normalized to unit length
/// so that similarity search can use a dot-product metric.
///
/// Must be configured identically at index build time and query time; the
/// index manifest fingerprint guards the model id and dimension, but a
/// weight-file swap behind an unchanged id is undetectable at runtime and
/// remains an operational invariant.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Top-k similarity search over the persisted chunk index. Read-only.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Returns at most `k` candidates, best first.
    async fn search(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<Candidate>>;
}

/// Second-pass relevance scoring of a small candidate set.
pub trait Reranker: Send + Sync {
    /// Scores each (query, chunk) pair, sorts descending, truncates to
    /// `min(top_n, candidates.len())`. Ties preserve input order.
    fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_n: usize,
    ) -> anyhow::Result<Vec<RankedCandidate>>;
}

/// One constrained completion request against a hosted model. No retries.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, context: &str, question: &str) -> Result<String, GenerationError>;
}

/// Best-effort text translation. `source` may be "auto".
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError>;
}
