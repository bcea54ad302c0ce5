//! First-pass candidate retrieval: embed the query, search the index.

use std::sync::Arc;

use assist_core::traits::{Embedder, VectorSearch};
use assist_core::types::Candidate;
use assist_core::{Error, Result};

/// Wraps the vector index with a fixed recall breadth K. K controls how
/// many candidates the reranker sees, independent of how many chunks end
/// up in the generation context.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorSearch>,
    k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorSearch>, k: usize) -> Self {
        Self { embedder, index, k }
    }

    /// Returns at most K candidates, best first. Purely functional given a
    /// loaded index; embedding or index errors are fatal for the request.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Candidate>> {
        let query_vec = self
            .embedder
            .embed(query)
            .map_err(|e| Error::Retrieval(format!("query embedding failed: {e}")))?;
        self.index
            .search(&query_vec, self.k)
            .await
            .map_err(|e| Error::Retrieval(format!("index search failed: {e}")))
    }
}
