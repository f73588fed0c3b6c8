//! Anthropic Claude adapter — the direct-protocol family.
//!
//! Claude does not share the OpenAI request shape: the system prompt
//! travels in its own field, messages carry only user/assistant turns,
//! and the reply arrives as a list of content blocks. This adapter owns
//! its wire types end to end; only the provider contract is shared.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use manifold_core::{GroundedRequest, GroundedSearchResult, ProviderError, Role};

use crate::openai_compat::{build_client, error_from_response, transport_error};
use crate::registry::Registration;
use crate::settings::{ProviderOptions, ProviderSettings};
use crate::traits::LlmProvider;

const NAME: &str = "claude";
const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Unknown,
}

// ─────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────

pub struct ClaudeProvider {
    settings: ProviderSettings,
    models: Vec<String>,
    client: reqwest::Client,
}

impl ClaudeProvider {
    pub fn new(models: Vec<String>, options: ProviderOptions) -> Self {
        let settings =
            ProviderSettings::build(DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT, &models, options);
        ClaudeProvider {
            settings,
            models,
            client: build_client(),
        }
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        catalog_key: NAME,
        ctor: |models, options| Box::new(ClaudeProvider::new(models, options)),
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
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

        // The system turn travels in its own field, not the messages array.
        let mut system = None;
        let mut wire_messages = Vec::new();
        for message in &messages {
            match message.role {
                Role::System => system = Some(message.content.as_str()),
                Role::User => wire_messages.push(WireMessage {
                    role: "user",
                    content: &message.content,
                }),
                Role::Assistant => wire_messages.push(WireMessage {
                    role: "assistant",
                    content: &message.content,
                }),
            }
        }

        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            system,
            messages: wire_messages,
        };

        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        debug!(model = %self.settings.model, url = %url, "sending chat completion");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::upstream(status, e.to_string()))?;

        // Reply is the first content block; an absent block is an empty reply.
        let reply = parsed
            .content
            .into_iter()
            .next()
            .map(|block| match block {
                ContentBlock::Text { text } => text,
                ContentBlock::Unknown => String::new(),
            })
            .unwrap_or_default();

        self.settings.finish_turn(&reply, persist);
        Ok(reply)
    }

    async fn grounded_search(
        &mut self,
        _request: &GroundedRequest,
    ) -> Result<GroundedSearchResult, ProviderError> {
        error!(provider = NAME, "grounded search requested on unsupported backend");
        Err(ProviderError::NotSupported {
            provider: NAME.to_string(),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
