//! OpenAI-compatible completion strategy.
//!
//! Four of the five backends speak the OpenAI chat-completions shape for
//! plain completion; this module is the single implementation they all
//! compose. It also carries the default grounded-search routine (the
//! tool-augmented `/responses` call) used by the first-party and
//! self-hosted adapters — the Google-hosted and search-focused adapters
//! override grounding with their own wire protocols.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use manifold_core::{
    ChatMessage, GroundedRequest, GroundedSearchResult, ProviderError, TokenMetrics,
};

use crate::settings::ProviderSettings;

/// Model-id prefixes of the reasoning tier. Requests for these models must
/// omit `temperature` and `max_output_tokens` entirely — the upstream
/// rejects the fields rather than ignoring them.
const REASONING_MODEL_PREFIXES: &[&str] = &["gpt-5"];

/// Whether a model id belongs to the reasoning tier.
pub(crate) fn reasoning_tier(model: &str) -> bool {
    REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

// ─────────────────────────────────────────────
// Shared HTTP plumbing
// ─────────────────────────────────────────────

/// Build the pooled HTTP client used by all adapters.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .expect("Failed to build HTTP client")
}

/// Map a transport failure (refused connection, timeout, …) to an
/// upstream error. Not retried here; the caller decides.
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    let status = err.status().map(|s| s.as_u16()).unwrap_or(500);
    error!(error = %err, "HTTP request failed");
    ProviderError::upstream(status, err.to_string())
}

/// Pull the upstream's own message out of an error body, if it has the
/// common `{"error": {"message": …}}` shape.
pub(crate) fn error_body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}

/// Consume a non-success response into a taxonomy-mapped error.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    let raw = error_body_message(&body).unwrap_or(body);
    error!(status, message = %raw, "provider API error");
    ProviderError::upstream(status, raw)
}

// ─────────────────────────────────────────────
// Wire types — chat completions
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    top_p: f64,
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<AssistantReply>,
}

#[derive(Debug, Deserialize)]
struct AssistantReply {
    content: Option<String>,
}

// ─────────────────────────────────────────────
// Wire types — responses (grounded search)
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    tools: &'static [ToolSpec],
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextFormat>,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    tool_type: &'static str,
}

const WEB_SEARCH_TOOLS: &[ToolSpec] = &[ToolSpec {
    tool_type: "web_search",
}];

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    format: SchemaFormat,
}

#[derive(Debug, Serialize)]
struct SchemaFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    name: &'static str,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<ResponsesUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum OutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(default)]
    text: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

// ─────────────────────────────────────────────
// Strategy
// ─────────────────────────────────────────────

/// The completion strategy composed into every OpenAI-compatible adapter.
pub struct OpenAiCompat {
    client: reqwest::Client,
}

impl Default for OpenAiCompat {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiCompat {
    pub fn new() -> Self {
        OpenAiCompat {
            client: build_client(),
        }
    }

    /// The underlying HTTP client, for adapters that add their own wire
    /// protocol on top of the shared plain completion.
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Plain chat completion against `{base}/chat/completions`.
    ///
    /// Bearer auth is attached only when an API key is configured — the
    /// self-hosted backend runs without one. A missing assistant message
    /// or missing content yields an empty string, not an error.
    pub async fn chat(
        &self,
        settings: &ProviderSettings,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );

        debug!(
            model = %settings.model,
            url = %url,
            messages = messages.len(),
            "sending chat completion"
        );

        let body = ChatCompletionRequest {
            model: &settings.model,
            messages,
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_completion_tokens: settings.max_tokens,
        };

        let mut request = self.client.post(&url).json(&body);
        if !settings.api_key.is_empty() {
            request = request.bearer_auth(&settings.api_key);
        }

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::upstream(status, e.to_string()))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        debug!(chars = reply.len(), "chat completion received");
        Ok(reply)
    }

    /// Default grounded-search routine: tool-augmented `{base}/responses`
    /// call with the `web_search` tool enabled.
    pub async fn grounded(
        &self,
        settings: &ProviderSettings,
        request: &GroundedRequest,
    ) -> Result<GroundedSearchResult, ProviderError> {
        let url = format!("{}/responses", settings.base_url.trim_end_matches('/'));

        let reasoning = reasoning_tier(&settings.model);
        let body = ResponsesRequest {
            tools: WEB_SEARCH_TOOLS,
            model: &settings.model,
            input: vec![
                InputMessage {
                    role: "system",
                    content: &settings.system_prompt,
                },
                InputMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: (!reasoning).then_some(settings.temperature),
            max_output_tokens: (!reasoning).then_some(settings.max_tokens),
            text: request.output_format.as_ref().map(|schema| TextFormat {
                format: SchemaFormat {
                    format_type: "json_schema",
                    name: "output",
                    schema: schema.clone(),
                },
            }),
        };

        debug!(model = %settings.model, url = %url, reasoning, "sending grounded search");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let parsed: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::upstream(status, e.to_string()))?;

        let mut text = String::new();
        let mut citations = Vec::new();
        for item in parsed.output {
            if let OutputItem::Message { content } = item {
                if let Some(first) = content.into_iter().next() {
                    text = first.text;
                    citations = first
                        .annotations
                        .into_iter()
                        .filter_map(|a| a.url)
                        .collect();
                }
                break;
            }
        }

        let usage = parsed.usage.unwrap_or(ResponsesUsage {
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
        });

        Ok(GroundedSearchResult {
            status_code: 200,
            message: GroundedSearchResult::message_from_text(&text),
            citations,
            metrics: TokenMetrics {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
