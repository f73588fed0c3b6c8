//! Model catalog — the injected table of provider model listings.
//!
//! For each provider name the catalog holds an ordered list of
//! `{display name, model id}` pairs. The catalog is consumed as data:
//! this layer never generates it, it only reads it. A builtin table ships
//! as the default; deployments may override it with a JSON file of the
//! same shape.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One selectable model: a human-facing display name and the wire id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelEntry {
    /// Display name (e.g. "Gemini 2.5 Flash").
    pub name: String,
    /// Model identifier sent on the wire (e.g. "gemini-2.5-flash").
    pub value: String,
}

impl ModelEntry {
    fn new(name: &str, value: &str) -> Self {
        ModelEntry {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Model listing for a single provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderModels {
    pub models: Vec<ModelEntry>,
}

/// Catalog of model listings, keyed by provider name.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog(pub HashMap<String, ProviderModels>);

impl Catalog {
    /// The builtin catalog.
    pub fn builtin() -> Self {
        let mut table = HashMap::new();

        table.insert(
            "openai".to_string(),
            ProviderModels {
                models: vec![
                    ModelEntry::new("gpt-5", "gpt-5"),
                    ModelEntry::new("o3-mini", "o3-mini"),
                    ModelEntry::new("o1", "o1"),
                    ModelEntry::new("gpt-4o", "gpt-4o"),
                    ModelEntry::new("gpt-4o mini", "gpt-4o-mini"),
                    ModelEntry::new("gpt-4.1", "gpt-4.1"),
                    ModelEntry::new("gpt-4.1-mini", "gpt-4.1-mini"),
                    ModelEntry::new("gpt-3.5-turbo", "gpt-3.5-turbo"),
                ],
            },
        );
        table.insert(
            "perplexity".to_string(),
            ProviderModels {
                models: vec![
                    ModelEntry::new("Sonar with Web Search", "sonar"),
                    ModelEntry::new("Sonar-pro with Web Search", "sonar-pro"),
                ],
            },
        );
        table.insert(
            "gemini".to_string(),
            ProviderModels {
                models: vec![
                    ModelEntry::new("Gemini 2.5 Flash-Lite", "gemini-2.5-flash-lite"),
                    ModelEntry::new("Gemini 2.5 Flash", "gemini-2.5-flash"),
                    ModelEntry::new("Gemini 2.5 Pro", "gemini-2.5-pro"),
                    ModelEntry::new("Gemini 2.0 Flash", "gemini-2.0-flash"),
                    ModelEntry::new("Gemini 2.0 Flash-Lite", "gemini-2.0-flash-lite"),
                    ModelEntry::new("Gemini 2.0 Pro", "gemini-2.0-pro"),
                ],
            },
        );
        table.insert(
            "ollama".to_string(),
            ProviderModels {
                models: vec![ModelEntry::new(
                    "Hermes3 8b Llama3.1 q8_0",
                    "hermes3:8b-llama3.1-q8_0",
                )],
            },
        );
        table.insert(
            "claude".to_string(),
            ProviderModels {
                models: vec![
                    ModelEntry::new("Claude Haiku 4.5", "claude-3-5-haiku-20241022"),
                    ModelEntry::new("Claude Sonnet 3.5", "claude-3-5-sonnet-20241022"),
                    ModelEntry::new("Claude Opus 3", "claude-3-opus-20240229"),
                    ModelEntry::new("Claude Haiku 3", "claude-3-haiku-20240307"),
                ],
            },
        );

        Catalog(table)
    }

    /// Load a catalog from a JSON file, falling back to the builtin table
    /// if the file is missing or unreadable.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Catalog::builtin();
        };

        if !path.exists() {
            info!("No catalog file at {}, using builtin", path.display());
            return Catalog::builtin();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read catalog file {}: {}", path.display(), e);
                return Catalog::builtin();
            }
        };

        match serde_json::from_str(&content) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Failed to parse catalog JSON: {}", e);
                Catalog::builtin()
            }
        }
    }

    /// Ordered entries for a provider, if listed.
    pub fn entries(&self, provider: &str) -> Option<&[ModelEntry]> {
        self.0.get(provider).map(|p| p.models.as_slice())
    }

    /// Ordered model ids for a provider; empty if unlisted.
    pub fn model_ids(&self, provider: &str) -> Vec<String> {
        self.entries(provider)
            .map(|models| models.iter().map(|m| m.value.clone()).collect())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
