//! Best-effort translation at the pipeline edges.
//!
//! The pipeline retrieves and generates in English only; this boundary
//! translates the query in and the answer out. A failed translation call
//! degrades to the original text with a warning and never blocks a
//! request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use assist_core::config::TranslationSettings;
use assist_core::error::TranslationError;
use assist_core::fallback::canonical_fallback;
use assist_core::traits::Translator;
use assist_core::types::Language;

/// Client for the free Google translate endpoint. `sl=auto` lets the
/// service detect the source language.
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(settings: &TranslationSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t"), ("q", text)])
            .send()
            .await
            .map_err(|e| TranslationError::Request { message: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Request { message: format!("HTTP {status}") });
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslationError::ResponseParse { message: e.to_string() })?;
        parse_gtx_response(&body)
    }
}

/// The gtx endpoint answers with a nested array; the translation is the
/// concatenation of the first element of each segment under `body[0]`.
fn parse_gtx_response(body: &Value) -> Result<String, TranslationError> {
    let segments = body.get(0).and_then(Value::as_array).ok_or_else(|| {
        TranslationError::ResponseParse { message: "missing segment array".to_string() }
    })?;
    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            out.push_str(piece);
        }
    }
    if out.is_empty() {
        return Err(TranslationError::ResponseParse {
            message: "no translated segments".to_string(),
        });
    }
    Ok(out)
}

/// Owns the translation policy around any `Translator` implementation.
pub struct TranslationBoundary {
    translator: Arc<dyn Translator>,
}

impl TranslationBoundary {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    /// Translate an incoming query to English when the UI language is not
    /// English. On failure the original text is used as the retrieval
    /// query: a known precision risk, degraded rather than fatal.
    pub async fn to_pipeline_language(&self, text: &str, source: Language) -> String {
        if source == Language::English {
            return text.to_string();
        }
        match self.translator.translate(text, "auto", "en").await {
            Ok(translated) => {
                debug!(original = %text, translated = %translated, "query translated to pipeline language");
                translated
            }
            Err(e) => {
                warn!(error = %e, "inbound translation failed, continuing with original text");
                text.to_string()
            }
        }
    }

    /// Translate an answer to the UI language. A fallback answer is never
    /// round-tripped through the translation service: the canonical
    /// sentence for the target language is returned directly, so users see
    /// a well-formed fallback regardless of service idiosyncrasies.
    pub async fn to_user_language(&self, text: &str, target: Language, is_fallback: bool) -> String {
        if is_fallback {
            return canonical_fallback(target).to_string();
        }
        if target == Language::English {
            return text.to_string();
        }
        match self.translator.translate(text, "en", target.code()).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "outbound translation failed, returning untranslated answer");
                text.to_string()
            }
        }
    }
}
