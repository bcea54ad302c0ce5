//! Pipeline configuration.
//!
//! One immutable `PipelineConfig` is loaded at startup and passed into the
//! orchestrator's constructor. Figment merges `config.toml`, an optional
//! `config.<env>.toml` selected by `RUST_ENV`, and `APP_*` environment
//! variables (nested keys split on `__`, e.g. `APP_INDEX__PATH`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pipeline: PipelineSettings,
    pub embedding: EmbeddingSettings,
    pub reranker: RerankerSettings,
    pub generator: GeneratorSettings,
    pub index: IndexSettings,
    pub translation: TranslationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Recall breadth fed to the reranker.
    pub retrieval_k: usize,
    /// How many reranked chunks reach the generator.
    pub rerank_top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_id: String,
    pub model_dir: String,
    pub dim: usize,
    pub max_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    pub model_id: String,
    pub model_dir: String,
    pub max_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub path: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub base_url: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { retrieval_k: 20, rerank_top_n: 5 }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_id: "BAAI/bge-small-en-v1.5".to_string(),
            model_dir: "models/bge-small-en-v1.5".to_string(),
            dim: 384,
            max_len: 256,
        }
    }
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            model_id: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            model_dir: "models/ms-marco-MiniLM-L-6-v2".to_string(),
            max_len: 512,
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: "llama3-70b-8192".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { path: "data/index".to_string(), table: "chunks".to_string() }
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self { base_url: "https://translate.googleapis.com".to_string() }
    }
}

impl PipelineConfig {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.retrieval_k == 0 {
            return Err(Error::InvalidConfig("pipeline.retrieval_k must be > 0".into()));
        }
        if self.pipeline.rerank_top_n == 0 {
            return Err(Error::InvalidConfig("pipeline.rerank_top_n must be > 0".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be > 0".into()));
        }
        if self.index.table.is_empty() {
            return Err(Error::InvalidConfig("index.table must not be empty".into()));
        }
        Ok(())
    }

    /// The index artifact directory, with `~` and `${VAR}` expanded.
    pub fn index_path(&self) -> PathBuf {
        expand_path(&self.index.path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. Absolute paths are returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
