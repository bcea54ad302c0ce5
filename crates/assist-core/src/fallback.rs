//! The canonical "no answer found" sentences and their detector.
//!
//! The fallback is an explicit string protocol between the generation
//! prompt and this detector. Detection runs on the raw English generator
//! output, before any translation, because translation is not a stable
//! round-trip; the per-language table below is what users see, never a
//! live translation of the English sentence.

use crate::types::Language;

/// The exact sentence the generation prompt mandates when the context does
/// not contain the answer. Must stay byte-identical to the prompt template.
pub const FALLBACK_EN: &str = "The answer is not available in the provided documents.";

/// Fixed Tamil rendering of the fallback sentence.
pub const FALLBACK_TA: &str = "கொடுக்கப்பட்ட ஆவணங்களில் பதில் கிடைக்கவில்லை.";

/// Exact equality against the canonical English sentence. Case- and
/// whitespace-sensitive; paraphrases are not fallbacks.
pub fn is_fallback(answer_text: &str) -> bool {
    answer_text == FALLBACK_EN
}

pub fn canonical_fallback(language: Language) -> &'static str {
    match language {
        Language::English => FALLBACK_EN,
        Language::Tamil => FALLBACK_TA,
    }
}
