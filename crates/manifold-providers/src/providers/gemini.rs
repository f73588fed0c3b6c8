//! Google-hosted Gemini adapter.
//!
//! Plain completion rides the OpenAI-compatible endpoint Google exposes;
//! grounded search is a raw REST call against the configured base URL
//! with the `google_search` tool declared. Token accounting and error
//! reporting use Gemini's own field names and are normalized here.

use async_trait::async_trait;
use tracing::{debug, error};

use manifold_core::{
    GroundedRequest, GroundedSearchResult, ProviderError, TokenMetrics,
};

use crate::openai_compat::{transport_error, OpenAiCompat};
use crate::registry::Registration;
use crate::settings::{ProviderOptions, ProviderSettings};
use crate::traits::LlmProvider;

const NAME: &str = "gemini";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Marker in an output schema that flags date-valued fields.
const DATE_FIELD_MARKER: &str = "{{date}}";

const FORMAT_RULES: &str = " Return structured outputs in JSON format only (no extra text). \
which follows all json rules, no extra text. Return 'N/A' for missing data or when \
information is not found. Return only what is asked without any additional text. For \
integer,double,long return a valid number, else 'N/A'. For boolean return true/false, \
else 'N/A'.";

const DATE_RULE: &str = " Dates: ISO format YYYY-MM-DDTHH:mm:ss.SSSZ \
(e.g. '2023-01-01T00:00:00.000Z'), if date is not found return 'N/A'.";

pub struct GeminiProvider {
    settings: ProviderSettings,
    models: Vec<String>,
    http: OpenAiCompat,
}

impl GeminiProvider {
    pub fn new(models: Vec<String>, options: ProviderOptions) -> Self {
        let settings =
            ProviderSettings::build(DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT, &models, options);
        GeminiProvider {
            settings,
            models,
            http: OpenAiCompat::new(),
        }
    }

    /// Build the grounding request body: prompt, `google_search` tool,
    /// and (for a real prompt) the generation config.
    fn grounding_body(&self, request: &GroundedRequest) -> serde_json::Value {
        let mut prompt_text = request.prompt.trim().to_string();
        let substituted = prompt_text.is_empty();
        if substituted {
            // The upstream rejects empty content outright.
            prompt_text = " ".to_string();
        }

        if let Some(format) = &request.output_format {
            let format_str = format.to_string();
            let date_rule = if format_str.to_lowercase().contains(DATE_FIELD_MARKER) {
                DATE_RULE
            } else {
                ""
            };
            prompt_text =
                format!("{prompt_text}\n\nFormat: {format_str}\nRules: {FORMAT_RULES}{date_rule}");
        }

        let mut body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt_text }] }],
            "tools": [{ "google_search": {} }],
        });
        if !substituted {
            body["generationConfig"] = serde_json::json!({
                "temperature": self.settings.temperature,
                "max_output_tokens": self.settings.max_tokens,
            });
        }
        body
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        catalog_key: NAME,
        ctor: |models, options| Box::new(GeminiProvider::new(models, options)),
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        NAME
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ProviderSettings {
        &mut self.settings
    }

    async fn chat_completion(
        &mut self,
        prompt: &str,
        persist: bool,
    ) -> Result<String, ProviderError> {
        let messages = self.settings.request_messages(prompt);
        let reply = self.http.chat(&self.settings, &messages).await?;
        self.settings.finish_turn(&reply, persist);
        Ok(reply)
    }

    async fn grounded_search(
        &mut self,
        request: &GroundedRequest,
    ) -> Result<GroundedSearchResult, ProviderError> {
        let body = self.grounding_body(request);

        debug!(model = %self.settings.model, url = %self.settings.base_url, "sending grounded search");

        let response = self
            .http
            .http_client()
            .post(&self.settings.base_url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let payload: serde_json::Value = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse grounding response");
            ProviderError::upstream(status, e.to_string())
        })?;

        // Errors arrive in the body, not the HTTP status line.
        if let Some(err_obj) = payload.get("error").filter(|v| v.is_object()) {
            let raw = err_obj
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error occurred");
            let mut code = err_obj.get("code").and_then(|c| c.as_u64()).unwrap_or(500) as u16;
            if raw.to_lowercase().contains("api key not valid") {
                code = 401;
            }
            error!(status = code, message = %raw, "grounded search failed");
            return Err(ProviderError::upstream(code, raw));
        }

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();
        let citations = payload["candidates"][0]["groundingMetadata"]["groundingChunks"]
            .as_array()
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(|chunk| chunk["web"]["uri"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let usage = &payload["usageMetadata"];
        let output_tokens = usage["candidatesTokenCount"].as_u64().unwrap_or(0)
            + usage["toolUseCompletionTokenCount"].as_u64().unwrap_or(0)
            + usage["thoughtsTokenCount"].as_u64().unwrap_or(0);

        Ok(GroundedSearchResult {
            status_code: 200,
            message: GroundedSearchResult::message_from_text(text),
            citations,
            metrics: TokenMetrics {
                input_tokens: usage["promptTokenCount"].as_u64().unwrap_or(0),
                output_tokens,
                total_tokens: usage["totalTokenCount"].as_u64().unwrap_or(0),
            },
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
