//! Context assembly for generation.

use assist_core::types::RankedCandidate;

pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Concatenate chunk texts best-first. No deduplication: near-identical
/// chunks from different documents pass through as-is. No truncation
/// either; `rerank_top_n` is the only bound, and an oversized context is a
/// configuration error the generator reports.
pub fn assemble(ranked: &[RankedCandidate]) -> String {
    ranked
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}
