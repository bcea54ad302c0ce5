//! Constrained answer generation against a hosted OpenAI-compatible
//! endpoint (Groq by default).
//!
//! One completion request per query, no retries; transport failures map to
//! `GenerationError` variants so the orchestrator can surface them
//! distinctly from a legitimate "not found" answer.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use assist_core::config::GeneratorSettings;
use assist_core::error::GenerationError;
use assist_core::fallback::FALLBACK_EN;
use assist_core::traits::Generator;

/// The fixed instruction template. The fallback sentence is interpolated
/// from the same constant the detector compares against, keeping the
/// string protocol in one place.
fn render_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert assistant for the district police department.\n\
         Your primary instruction is to answer the user's question based ONLY on the following context.\n\
         If the information is not in the context, you MUST respond with:\n\
         \"{FALLBACK_EN}\"\n\
         Do not use any outside knowledge. Be concise, respectful, and helpful.\n\n\
         <context>\n{context}\n</context>\n\n\
         Question: {question}\n\
         Answer:"
    )
}

pub struct HostedGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HostedGenerator {
    /// Reads the API key from the environment variable named in the
    /// configuration.
    pub fn new(settings: &GeneratorSettings) -> Result<Self, GenerationError> {
        let api_key =
            std::env::var(&settings.api_key_env).map_err(|_| GenerationError::AuthFailed {
                provider: format!("{}: env var '{}' not set", settings.base_url, settings.api_key_env),
            })?;
        Ok(Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl Generator for HostedGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        // Temperature 0 is a design requirement, not a tuning choice:
        // fallback detection depends on byte-exact output for identical
        // (context, question) pairs.
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": render_prompt(context, question)}],
            "temperature": 0.0,
            "stream": false,
        });

        debug!(url = %url, model = %self.model, "sending completion request");
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::ApiRequest { message: format!("request failed: {e}") })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| GenerationError::ApiRequest {
            message: format!("failed to read response body: {e}"),
        })?;
        if !status.is_success() {
            return Err(map_http_error(&self.base_url, status, &response_body));
        }

        let parsed: Value =
            serde_json::from_str(&response_body).map_err(|e| GenerationError::ResponseParse {
                message: format!("invalid JSON: {e}"),
            })?;
        parse_response(&parsed)
    }
}

/// Map an HTTP status code to the matching GenerationError.
fn map_http_error(provider: &str, status: reqwest::StatusCode, body: &str) -> GenerationError {
    match status.as_u16() {
        401 => GenerationError::AuthFailed { provider: provider.to_string() },
        429 => {
            // Rate-limit messages usually end with "try again in Xs".
            let retry_secs = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| {
                    v.get("error")?.get("message")?.as_str().map(|s| s.to_string())
                })
                .and_then(|msg| {
                    msg.split("in ")
                        .last()
                        .and_then(|s| s.trim_end_matches('s').parse::<u64>().ok())
                })
                .unwrap_or(5);
            GenerationError::RateLimited { retry_after_secs: retry_secs }
        }
        s if s >= 500 => GenerationError::ApiRequest {
            message: format!("server error ({s}): {body}"),
        },
        s => GenerationError::ApiRequest { message: format!("HTTP {s}: {body}") },
    }
}

fn parse_response(body: &Value) -> Result<String, GenerationError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| GenerationError::ResponseParse {
            message: "no message content in response".to_string(),
        })
}
