//! Domain types shared across the retrieval and generation crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// A bounded span of source-document text, the atomic unit of retrieval.
///
/// Produced once by the offline ingestion job and immutable afterwards.
/// `source_metadata` carries provenance such as the source file and page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub text: String,
    #[serde(default)]
    pub source_metadata: Meta,
}

/// A first-pass retrieval hit, ordered by descending `similarity_score`.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk: DocumentChunk,
    pub similarity_score: f32,
}

/// A second-pass reranked hit, ordered by descending `relevance_score`.
///
/// The reranker's score space is independent of `similarity_score`; the
/// two are never compared.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub chunk: DocumentChunk,
    pub relevance_score: f32,
}

/// The pipeline's answer for a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub answer_text: String,
    pub is_fallback: bool,
}

/// Languages the user-facing surface supports. The pipeline itself always
/// retrieves and generates in English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Tamil,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Tamil => "ta",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "ta" | "tamil" => Some(Language::Tamil),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for lang in [Language::English, Language::Tamil] {
            assert_eq!(Language::parse(lang.code()), Some(lang));
        }
        assert_eq!(Language::parse("Tamil"), Some(Language::Tamil));
        assert_eq!(Language::parse("fr"), None);
    }
}
