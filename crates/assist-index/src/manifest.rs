//! Index artifact manifest.
//!
//! Written next to the LanceDB table by the builder and validated at load
//! time: similarity scores are meaningless if query-time embeddings come
//! from a different model or dimension than the indexed ones.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub embedding_model: String,
    pub dim: usize,
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
    pub chunk_count: usize,
}

impl IndexManifest {
    pub fn new(embedding_model: &str, dim: usize, chunk_count: usize) -> Self {
        Self {
            embedding_model: embedding_model.to_string(),
            dim,
            fingerprint: fingerprint(embedding_model, dim),
            built_at: Utc::now(),
            chunk_count,
        }
    }

    pub fn path(index_dir: &Path) -> PathBuf {
        index_dir.join(MANIFEST_FILE)
    }

    pub fn write(&self, index_dir: &Path) -> Result<()> {
        let path = Self::path(index_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing manifest to {}", path.display()))?;
        Ok(())
    }

    pub fn read(index_dir: &Path) -> Result<Self> {
        let path = Self::path(index_dir);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("reading manifest from {}", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Stable fingerprint of the embedding configuration an index was built
/// with. Compared verbatim at load time.
pub fn fingerprint(model_id: &str, dim: usize) -> String {
    blake3::hash(format!("{model_id}:{dim}").as_bytes())
        .to_hex()
        .to_string()
}
