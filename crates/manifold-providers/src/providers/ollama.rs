//! Self-hosted Ollama adapter.
//!
//! Same OpenAI-compatible wire shape as the first-party backend, pointed
//! at a local daemon. No API key is required — one is accepted for
//! interface uniformity but never sent when empty.

use async_trait::async_trait;

use manifold_core::{GroundedRequest, GroundedSearchResult, ProviderError};

use crate::openai_compat::OpenAiCompat;
use crate::registry::Registration;
use crate::settings::{ProviderOptions, ProviderSettings};
use crate::traits::LlmProvider;

const NAME: &str = "ollama";
const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub struct OllamaProvider {
    settings: ProviderSettings,
    models: Vec<String>,
    http: OpenAiCompat,
}

impl OllamaProvider {
    pub fn new(models: Vec<String>, options: ProviderOptions) -> Self {
        let settings =
            ProviderSettings::build(DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT, &models, options);
        OllamaProvider {
            settings,
            models,
            http: OpenAiCompat::new(),
        }
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        catalog_key: NAME,
        ctor: |models, options| Box::new(OllamaProvider::new(models, options)),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
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
        self.http.grounded(&self.settings, request).await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
