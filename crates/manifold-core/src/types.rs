//! Core types for Manifold — the chat message model and the canonical
//! grounded-search result shape shared by every provider adapter.
//!
//! Upstream APIs disagree on field names for the same data (token counts in
//! particular); everything that crosses the provider boundary is normalized
//! into the types below so callers never branch on the backend.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Role of a conversation turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single conversation turn.
///
/// History invariant: a non-empty history starts with exactly one system
/// entry followed by user/assistant turns. This is best-effort — resets
/// simply clear the list and the next call re-seeds it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Grounded search
// ─────────────────────────────────────────────

/// Input to a grounded (web-search-augmented) completion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GroundedRequest {
    /// The user prompt.
    pub prompt: String,
    /// Optional output schema the completion text should conform to.
    /// When present, adapters attempt to parse the reply as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<serde_json::Value>,
}

impl GroundedRequest {
    /// Plain prompt with no output schema.
    pub fn new(prompt: impl Into<String>) -> Self {
        GroundedRequest {
            prompt: prompt.into(),
            output_format: None,
        }
    }

    /// Attach an output schema.
    pub fn with_output_format(mut self, format: serde_json::Value) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Token accounting, normalized across backends.
///
/// Upstream names differ (`input_tokens`, `prompt_tokens`,
/// `promptTokenCount`, …) — adapters translate into these three fields.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Canonical result of a grounded search, identical for every backend.
///
/// Constructed fresh per call and never mutated after return.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundedSearchResult {
    /// Upstream HTTP status (200 on success).
    pub status_code: u16,
    /// Parsed completion. JSON when the reply parsed as such, otherwise
    /// `{"text": <raw reply>}`.
    pub message: serde_json::Value,
    /// Source URLs extracted from the upstream citation metadata.
    pub citations: Vec<String>,
    /// Normalized token accounting.
    pub metrics: TokenMetrics,
}

impl GroundedSearchResult {
    /// Parse completion text as JSON, wrapping parse failures as
    /// `{"text": <raw>}` instead of failing the call.
    pub fn message_from_text(raw: &str) -> serde_json::Value {
        if raw.is_empty() {
            return serde_json::json!({});
        }
        serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "text": raw }))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::system("You are a helpful assistant.");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "You are a helpful assistant.");
    }

    #[test]
    fn test_message_round_trip() {
        let messages = vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("What is 2+2?"),
            ChatMessage::assistant("The answer is 4."),
        ];

        let json_str = serde_json::to_string(&messages).unwrap();
        let deserialized: Vec<ChatMessage> = serde_json::from_str(&json_str).unwrap();

        assert_eq!(messages, deserialized);
    }

    #[test]
    fn test_message_from_text_valid_json() {
        let parsed = GroundedSearchResult::message_from_text(r#"{"answer": 42}"#);
        assert_eq!(parsed, json!({"answer": 42}));
    }

    #[test]
    fn test_message_from_text_plain_text() {
        let parsed = GroundedSearchResult::message_from_text("The answer is 42.");
        assert_eq!(parsed, json!({"text": "The answer is 42."}));
    }

    #[test]
    fn test_message_from_text_empty() {
        let parsed = GroundedSearchResult::message_from_text("");
        assert_eq!(parsed, json!({}));
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = GroundedSearchResult {
            status_code: 200,
            message: json!({"text": "hello"}),
            citations: vec!["https://example.com".to_string()],
            metrics: TokenMetrics {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status_code"], 200);
        assert_eq!(json["message"]["text"], "hello");
        assert_eq!(json["citations"][0], "https://example.com");
        assert_eq!(json["metrics"]["input_tokens"], 10);
        assert_eq!(json["metrics"]["output_tokens"], 5);
        assert_eq!(json["metrics"]["total_tokens"], 15);
    }

    #[test]
    fn test_grounded_request_with_format() {
        let req = GroundedRequest::new("find the release date")
            .with_output_format(json!({"release": "{{date}}"}));

        assert_eq!(req.prompt, "find the release date");
        assert!(req.output_format.is_some());
    }
}
