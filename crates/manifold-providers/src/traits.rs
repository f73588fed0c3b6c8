//! The provider contract — every LLM backend implements this trait.
//!
//! One trait object per configured instance; instances are exclusively
//! owned by the caller that resolved them and are never shared across
//! concurrent requests. The mutable generation parameters live in the
//! instance's [`ProviderSettings`] record, reachable through
//! [`LlmProvider::settings_mut`].

use async_trait::async_trait;
use serde::Serialize;

use manifold_core::{GroundedRequest, GroundedSearchResult, ProviderError};

use crate::settings::ProviderSettings;

// ─────────────────────────────────────────────
// Config schema
// ─────────────────────────────────────────────

/// Semantic type of a configuration parameter.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Float,
    Int,
}

/// Ordered `parameter name → semantic type` table.
pub type ConfigSchema = &'static [(&'static str, ParamType)];

/// The configuration surface shared by all current adapters.
pub const BASE_CONFIG_SCHEMA: ConfigSchema = &[
    ("model", ParamType::String),
    ("api_key", ParamType::String),
    ("temperature", ParamType::Float),
    ("top_p", ParamType::Float),
    ("max_tokens", ParamType::Int),
    ("system_prompt", ParamType::String),
];

// ─────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────

/// Capability contract implemented by every backend adapter.
///
/// Each completion call performs at most one outbound round trip. The
/// synchronous and asynchronous variants are semantically identical and
/// differ only in suspension model.
#[async_trait]
pub trait LlmProvider: Send {
    /// Stable provider name (lowercase), e.g. `"openai"`.
    fn provider_name(&self) -> &str;

    /// Ordered model identifiers available on this backend.
    fn models(&self) -> &[String];

    /// Configuration parameter table.
    fn config_schema(&self) -> ConfigSchema {
        BASE_CONFIG_SCHEMA
    }

    /// The instance's settings record.
    fn settings(&self) -> &ProviderSettings;

    /// Mutable access to the settings record; mutators chain from here:
    /// `provider.settings_mut().set_temperature(0.7)?.set_top_p(0.9)?;`
    fn settings_mut(&mut self) -> &mut ProviderSettings;

    /// The endpoint this instance talks to.
    fn base_url(&self) -> &str {
        &self.settings().base_url
    }

    /// Single- or multi-turn completion.
    ///
    /// With `persist = false` (the stateless default) the conversation
    /// history is reset to empty after the call; with `persist = true`
    /// the assistant reply is appended for reuse by the next call on the
    /// same instance.
    async fn chat_completion(
        &mut self,
        prompt: &str,
        persist: bool,
    ) -> Result<String, ProviderError>;

    /// Blocking variant of [`chat_completion`](Self::chat_completion):
    /// identical request semantics, blocks the calling thread for the
    /// duration of the network call. Must not be called from inside an
    /// async runtime.
    fn chat_completion_blocking(
        &mut self,
        prompt: &str,
        persist: bool,
    ) -> Result<String, ProviderError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ProviderError::upstream(500, e.to_string()))?;
        runtime.block_on(self.chat_completion(prompt, persist))
    }

    /// Web-search-augmented completion, normalized into the canonical
    /// result shape. `NotSupported` is a valid failure for backends
    /// without the capability.
    async fn grounded_search(
        &mut self,
        request: &GroundedRequest,
    ) -> Result<GroundedSearchResult, ProviderError>;
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
