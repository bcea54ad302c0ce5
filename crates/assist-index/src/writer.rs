//! Offline index builder.
//!
//! Consumes pre-chunked documents plus an embedder and writes the queryable
//! artifact: the LanceDB table in record batches, then the manifest. Must
//! not run against a path a live serving process is reading.

use anyhow::{bail, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use assist_core::traits::Embedder;
use assist_core::types::DocumentChunk;

use crate::manifest::IndexManifest;
use crate::schema::build_arrow_schema;

const INSERT_BATCH_SIZE: usize = 1000;

struct IndexRow {
    id: String,
    text: String,
    metadata_json: String,
    vector: Vec<f32>,
}

pub struct IndexBuilder {
    db: Connection,
    index_dir: PathBuf,
    table_name: String,
}

impl IndexBuilder {
    pub async fn create(index_dir: &Path, table_name: &str) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;
        let db = connect(index_dir.to_string_lossy().as_ref()).execute().await?;
        Ok(Self {
            db,
            index_dir: index_dir.to_path_buf(),
            table_name: table_name.to_string(),
        })
    }

    /// Embed every chunk and write the table plus manifest. Returns the
    /// manifest describing the finished artifact.
    pub async fn build(
        &self,
        chunks: &[DocumentChunk],
        embedder: &dyn Embedder,
        model_id: &str,
    ) -> Result<IndexManifest> {
        if chunks.is_empty() {
            bail!("no chunks to index");
        }
        let dim = embedder.dim();
        info!(chunks = chunks.len(), table = %self.table_name, "building vector index");

        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
                .progress_chars("#>-"),
        );

        let mut batch_rows = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let vector = embedder.embed(&chunk.text)?;
            if vector.len() != dim {
                bail!("embedder returned {} floats, expected {dim}", vector.len());
            }
            batch_rows.push(IndexRow {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata_json: serde_json::to_string(&chunk.source_metadata)?,
                vector,
            });
            pb.set_position((i + 1) as u64);
            if batch_rows.len() >= INSERT_BATCH_SIZE || i == chunks.len() - 1 {
                self.insert_batch(&batch_rows, dim).await?;
                batch_rows.clear();
            }
        }
        pb.finish_and_clear();

        let manifest = IndexManifest::new(model_id, dim, chunks.len());
        manifest.write(&self.index_dir)?;
        info!(chunks = chunks.len(), "vector index built");
        Ok(manifest)
    }

    async fn insert_batch(&self, rows: &[IndexRow], dim: usize) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let record_batch = rows_to_record_batch(rows, dim)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.db.table_names().execute().await?.contains(&self.table_name) {
            self.db
                .open_table(&self.table_name)
                .execute()
                .await?
                .add(reader)
                .execute()
                .await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }
}

fn rows_to_record_batch(rows: &[IndexRow], dim: usize) -> Result<RecordBatch> {
    let schema = build_arrow_schema(dim as i32);
    let mut ids = Vec::with_capacity(rows.len());
    let mut texts = Vec::with_capacity(rows.len());
    let mut metadata = Vec::with_capacity(rows.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.id.clone());
        texts.push(row.text.clone());
        metadata.push(row.metadata_json.clone());
        vectors.push(Some(row.vector.iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(metadata)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<
                arrow_array::types::Float32Type,
                _,
                _,
            >(vectors.into_iter(), dim as i32)),
        ],
    )?;
    Ok(record_batch)
}
