//! Read-only similarity search over the persisted artifact.

use anyhow::{anyhow, bail, Result};
use arrow_array::{Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use tracing::debug;

use assist_core::config::PipelineConfig;
use assist_core::traits::VectorSearch;
use assist_core::types::{Candidate, DocumentChunk, Meta};
use assist_core::Error;

use crate::manifest::{self, IndexManifest};

pub struct VectorIndex {
    db: Connection,
    table_name: String,
    dim: usize,
}

impl VectorIndex {
    /// Open the persisted index for the given configuration.
    ///
    /// Fails with `MissingIndex` when the artifact directory, manifest or
    /// table is absent (the offline build step has not run), and with
    /// `InvalidConfig` when the manifest fingerprint does not match the
    /// configured embedding model.
    pub async fn open(config: &PipelineConfig) -> std::result::Result<Self, Error> {
        let path = config.index_path();
        if !path.exists() {
            return Err(Error::MissingIndex { path });
        }
        let manifest =
            IndexManifest::read(&path).map_err(|_| Error::MissingIndex { path: path.clone() })?;

        let expected = manifest::fingerprint(&config.embedding.model_id, config.embedding.dim);
        if manifest.fingerprint != expected {
            return Err(Error::InvalidConfig(format!(
                "index at {} was built with embedding model {} (dim {}), configuration expects {} (dim {})",
                path.display(),
                manifest.embedding_model,
                manifest.dim,
                config.embedding.model_id,
                config.embedding.dim,
            )));
        }

        let db = connect(path.to_string_lossy().as_ref())
            .execute()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;
        let names = db
            .table_names()
            .execute()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;
        if !names.contains(&config.index.table) {
            return Err(Error::MissingIndex { path });
        }
        debug!(chunks = manifest.chunk_count, table = %config.index.table, "vector index opened");

        Ok(Self {
            db,
            table_name: config.index.table.clone(),
            dim: config.embedding.dim,
        })
    }

    /// Whether a plausible artifact exists at the configured path. Cheap
    /// filesystem check used by the startup readiness probe.
    pub fn artifact_exists(config: &PipelineConfig) -> bool {
        let path = config.index_path();
        path.exists() && IndexManifest::read(&path).is_ok()
    }

    async fn search_impl(&self, query_vec: &[f32], k: usize) -> Result<Vec<Candidate>> {
        if query_vec.len() != self.dim {
            bail!("query vector has {} floats, index expects {}", query_vec.len(), self.dim);
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .vector_search(query_vec.to_vec())?
            .limit(k)
            .execute()
            .await?;

        let mut candidates = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            decode_batch(&batch, &mut candidates)?;
        }
        candidates.truncate(k);
        Ok(candidates)
    }
}

#[async_trait]
impl VectorSearch for VectorIndex {
    async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<Candidate>> {
        self.search_impl(query_vec, k).await
    }
}

fn decode_batch(batch: &RecordBatch, out: &mut Vec<Candidate>) -> Result<()> {
    let ids = string_column(batch, "id")?;
    let texts = string_column(batch, "text")?;
    let metadata = string_column(batch, "metadata")?;
    let distances = batch
        .column_by_name("_distance")
        .or_else(|| batch.column_by_name("distance"))
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| anyhow!("distance column missing from search result"))?;

    for i in 0..batch.num_rows() {
        let source_metadata: Meta = serde_json::from_str(metadata.value(i)).unwrap_or_default();
        // Unit-norm vectors: 1 - distance is monotone in cosine similarity.
        let similarity_score = 1.0 - distances.value(i);
        out.push(Candidate {
            chunk: DocumentChunk {
                id: ids.value(i).to_string(),
                text: texts.value(i).to_string(),
                source_metadata,
            },
            similarity_score,
        });
    }
    Ok(())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not utf8"))
}
