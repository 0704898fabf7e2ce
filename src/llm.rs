//! Generative model abstraction.
//!
//! Defines the [`LanguageModel`] trait and the [`GeminiClient`]
//! implementation, which calls the Gemini `generateContent` endpoint.
//!
//! # Failure Semantics
//!
//! [`LanguageModel::generate`] never returns an error. Transport failures,
//! non-2xx responses, and responses without text all become
//! [`GenerationOutcome::Degraded`] with a diagnostic of the form
//! `"Gemini API error: <cause>"`. The caller decides how to surface it.
//!
//! # Request Shape
//!
//! ```json
//! {
//!   "contents": [
//!     { "role": "user",  "parts": [{ "text": "earlier question" }] },
//!     { "role": "model", "parts": [{ "text": "earlier answer" }] },
//!     { "role": "user",  "parts": [{ "text": "<prompt>" }] }
//!   ],
//!   "generationConfig": { "temperature": 0.2 }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::{model_api_key, Config, ModelConfig};
use crate::models::{ConversationTurn, GenerationOutcome, Role};

/// Prefix of every degraded diagnostic produced by [`GeminiClient`].
pub const DEGRADED_PREFIX: &str = "Gemini API error";

/// A chat-style text generator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-1.5-flash"`).
    fn model_name(&self) -> &str;

    /// Send `prompt` as the next user message after `history`.
    async fn generate(&self, prompt: &str, history: &[ConversationTurn]) -> GenerationOutcome;
}

/// Build the configured model client. Requires `GEMINI_API_KEY`.
pub fn create_model(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    let api_key = model_api_key()?;
    Ok(Arc::new(GeminiClient::new(&config.model, api_key)?))
}

// ============ Gemini ============

/// Client for `POST {base_url}/v1beta/models/{model}:generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    temperature: f64,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.name
        );

        Ok(Self {
            client,
            url,
            model: config.name.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    async fn call(&self, prompt: &str, history: &[ConversationTurn]) -> Result<String> {
        let body = request_body(prompt, history, self.temperature);

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            anyhow::bail!("{}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_gemini_response(&json)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, history: &[ConversationTurn]) -> GenerationOutcome {
        match self.call(prompt, history).await {
            Ok(text) => GenerationOutcome::Success(text),
            Err(e) => {
                warn!(model = %self.model, error = %e, "generation degraded");
                GenerationOutcome::Degraded(format!("{}: {}", DEGRADED_PREFIX, e))
            }
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

/// Build the `generateContent` request body.
fn request_body(prompt: &str, history: &[ConversationTurn], temperature: f64) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .map(|turn| {
            let parts: Vec<Value> = turn.parts.iter().map(|p| json!({ "text": p })).collect();
            json!({ "role": role_name(turn.role), "parts": parts })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": prompt }] }));

    json!({
        "contents": contents,
        "generationConfig": { "temperature": temperature },
    })
}

/// Extract the answer text from a `generateContent` response.
///
/// Concatenates `candidates[0].content.parts[*].text`.
fn parse_gemini_response(json: &Value) -> Result<String> {
    let candidate = match json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    {
        Some(candidate) => candidate,
        None => {
            if let Some(reason) = json
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str())
            {
                anyhow::bail!("prompt blocked: {}", reason);
            }
            anyhow::bail!("Invalid Gemini response: missing candidates");
        }
    };

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = candidate
                .get("finishReason")
                .and_then(|r| r.as_str())
                .unwrap_or("unknown");
            anyhow::anyhow!("Invalid Gemini response: no content (finishReason: {})", reason)
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        anyhow::bail!("Invalid Gemini response: empty text");
    }
    Ok(text)
}
