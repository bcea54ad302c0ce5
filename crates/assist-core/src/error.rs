//! Error taxonomy for the answer pipeline.
//!
//! Startup-class errors (`MissingIndex`, `InvalidConfig`) stop the process
//! from serving. Per-request errors surface at the orchestrator boundary as
//! messages distinct from the canonical fallback sentence, so callers can
//! tell "no answer in the documents" apart from "the system is broken".

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("vector index missing at {path}: run assist-indexer to build it")]
    MissingIndex { path: PathBuf },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Failure modes of the hosted completion call. Surfaced distinctly from a
/// legitimate fallback answer; never converted into one.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("authentication failed for {provider}")]
    AuthFailed { provider: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("api request failed: {message}")]
    ApiRequest { message: String },

    #[error("unparseable completion response: {message}")]
    ResponseParse { message: String },
}

/// Failure modes of the translation call. Non-fatal: confined to the
/// translation boundary, which degrades to the untranslated text.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {message}")]
    Request { message: String },

    #[error("unparseable translation response: {message}")]
    ResponseParse { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
