//! Per-instance provider settings.
//!
//! Every resolved adapter owns exactly one [`ProviderSettings`] record —
//! there is no process-wide provider state. The record also carries the
//! conversation history and implements the seeding/reset policy shared by
//! all adapters.

use manifold_core::{ChatMessage, ProviderError};

/// Placeholder credential used when instantiating throwaway adapters for
/// metadata discovery. Never sent on the wire.
pub(crate) const PLACEHOLDER_API_KEY: &str = "placeholder-key";
pub(crate) const PLACEHOLDER_MODEL: &str = "placeholder-model";

// ─────────────────────────────────────────────
// Caller-supplied overrides
// ─────────────────────────────────────────────

/// Partial settings supplied by the caller at resolution time.
///
/// Anything left `None` takes the adapter's default.
#[derive(Clone, Debug, Default)]
pub struct ProviderOptions {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
}

impl ProviderOptions {
    /// Start from an API key, the most common case.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        ProviderOptions {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Select a model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the system prompt.
    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Options for the registry's metadata-discovery probe.
    pub(crate) fn discovery() -> Self {
        ProviderOptions {
            api_key: Some(PLACEHOLDER_API_KEY.to_string()),
            model: Some(PLACEHOLDER_MODEL.to_string()),
            ..Default::default()
        }
    }
}

// ─────────────────────────────────────────────
// Settings record
// ─────────────────────────────────────────────

/// Mutable configuration and conversation state of one provider instance.
///
/// Mutators validate where a range applies and return `&mut Self` for
/// chaining: `settings.set_temperature(0.7)?.set_top_p(0.9)?;`
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub base_url: String,
    pub system_prompt: String,
    history: Vec<ChatMessage>,
}

impl ProviderSettings {
    /// Merge caller options over the adapter's defaults. The default model
    /// is the first catalog entry.
    pub fn build(
        default_base_url: &str,
        default_system_prompt: &str,
        models: &[String],
        options: ProviderOptions,
    ) -> Self {
        ProviderSettings {
            api_key: options.api_key.unwrap_or_default(),
            model: options
                .model
                .or_else(|| models.first().cloned())
                .unwrap_or_default(),
            temperature: options.temperature.unwrap_or(0.1),
            top_p: options.top_p.unwrap_or(0.1),
            max_tokens: options.max_tokens.unwrap_or(2048),
            base_url: options
                .base_url
                .unwrap_or_else(|| default_base_url.to_string()),
            system_prompt: options
                .system_prompt
                .unwrap_or_else(|| default_system_prompt.to_string()),
            history: Vec::new(),
        }
    }

    // ── Mutators ──

    pub fn set_model(&mut self, model: impl Into<String>) -> Result<&mut Self, ProviderError> {
        self.model = model.into();
        Ok(self)
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<&mut Self, ProviderError> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ProviderError::invalid(
                "temperature",
                "must be between 0 and 1",
            ));
        }
        self.temperature = temperature;
        Ok(self)
    }

    pub fn set_top_p(&mut self, top_p: f64) -> Result<&mut Self, ProviderError> {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(ProviderError::invalid("top_p", "must be between 0 and 1"));
        }
        self.top_p = top_p;
        Ok(self)
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<&mut Self, ProviderError> {
        self.max_tokens = max_tokens;
        Ok(self)
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<&mut Self, ProviderError> {
        self.base_url = base_url.into();
        Ok(self)
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<&mut Self, ProviderError> {
        self.api_key = api_key.into();
        Ok(self)
    }

    pub fn set_system_prompt(
        &mut self,
        system_prompt: impl Into<String>,
    ) -> Result<&mut Self, ProviderError> {
        self.system_prompt = system_prompt.into();
        Ok(self)
    }

    // ── Conversation history ──

    /// Current conversation history.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Seed or extend the history with the new user turn and return the
    /// message list for this request. An empty history is seeded as
    /// `[system, user]`; otherwise only the user turn is appended.
    pub fn request_messages(&mut self, prompt: &str) -> Vec<ChatMessage> {
        if self.history.is_empty() {
            self.history
                .push(ChatMessage::system(self.system_prompt.clone()));
        }
        self.history.push(ChatMessage::user(prompt));
        self.history.clone()
    }

    /// Reconcile the history after a completed call: append the assistant
    /// reply when persisting, otherwise reset to empty. The non-persist
    /// reset drops the just-sent user turn as well — every call is an
    /// independent single turn unless the caller opts in.
    pub fn finish_turn(&mut self, reply: &str, persist: bool) {
        if persist {
            self.history.push(ChatMessage::assistant(reply));
        } else {
            self.history.clear();
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
