//! Search-focused Perplexity adapter.
//!
//! Plain completion rides the shared OpenAI-compatible strategy; grounded
//! search uses Perplexity's chat endpoint with `search_mode: "web"` and
//! returns citations at the top level of the response.

use async_trait::async_trait;
use tracing::{debug, error};

use manifold_core::{
    GroundedRequest, GroundedSearchResult, ProviderError, TokenMetrics,
};

use crate::openai_compat::{error_body_message, transport_error, OpenAiCompat};
use crate::registry::Registration;
use crate::settings::{ProviderOptions, ProviderSettings};
use crate::traits::LlmProvider;

const NAME: &str = "perplexity";
const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai";
const DEFAULT_SYSTEM_PROMPT: &str = "you are a helpful assistant.";

/// The upstream reports an empty prompt with this exact string; it is
/// rewritten to a clearer domain message before taxonomy lookup.
const EMPTY_CONTENT_UPSTREAM: &str = "Message content was empty";
const EMPTY_CONTENT_MESSAGE: &str = "Content of the message is empty";

pub struct PerplexityProvider {
    settings: ProviderSettings,
    models: Vec<String>,
    http: OpenAiCompat,
}

impl PerplexityProvider {
    pub fn new(models: Vec<String>, options: ProviderOptions) -> Self {
        let settings =
            ProviderSettings::build(DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT, &models, options);
        PerplexityProvider {
            settings,
            models,
            http: OpenAiCompat::new(),
        }
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        catalog_key: NAME,
        ctor: |models, options| Box::new(PerplexityProvider::new(models, options)),
    }
}

#[async_trait]
impl LlmProvider for PerplexityProvider {
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
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "stream": false,
            "search_mode": "web",
            "web_search_options": { "search_context_size": "medium" },
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens,
        });
        if let Some(format) = &request.output_format {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": { "schema": format },
            });
        }

        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );

        debug!(model = %self.settings.model, url = %url, "sending grounded search");

        let response = self
            .http
            .http_client()
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let raw = error_body_message(&body_text).unwrap_or_else(|| {
                if body_text.is_empty() {
                    "Unknown error".to_string()
                } else {
                    body_text
                }
            });
            error!(status, message = %raw, "grounded search failed");
            if raw == EMPTY_CONTENT_UPSTREAM {
                return Err(ProviderError::upstream_verbatim(status, EMPTY_CONTENT_MESSAGE));
            }
            return Err(ProviderError::upstream(status, raw));
        }

        let status = response.status().as_u16();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::upstream(status, e.to_string()))?;

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();
        let citations = payload["citations"]
            .as_array()
            .map(|urls| {
                urls.iter()
                    .filter_map(|u| u.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        let usage = &payload["usage"];

        Ok(GroundedSearchResult {
            status_code: 200,
            message: GroundedSearchResult::message_from_text(text),
            citations,
            metrics: TokenMetrics {
                input_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0),
                output_tokens: usage["completion_tokens"].as_u64().unwrap_or(0),
                total_tokens: usage["total_tokens"].as_u64().unwrap_or(0),
            },
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn models() -> Vec<String> {
        vec!["sonar".to_string(), "sonar-pro".to_string()]
    }

    fn provider_for(server: &MockServer) -> PerplexityProvider {
        PerplexityProvider::new(
            models(),
            ProviderOptions::with_api_key("pplx-key").base_url(server.uri()),
        )
    }

    #[test]
    fn test_defaults() {
        let provider = PerplexityProvider::new(models(), ProviderOptions::default());
        assert_eq!(provider.provider_name(), "perplexity");
        assert_eq!(provider.base_url(), "https://api.perplexity.ai");
        assert_eq!(provider.settings().model, "sonar");
        assert_eq!(provider.settings().system_prompt, "you are a helpful assistant.");
    }

    #[tokio::test]
    async fn test_grounded_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "search_mode": "web",
                "web_search_options": { "search_context_size": "medium" },
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"fact\": true}" } }],
                "citations": ["https://source.one", "https://source.two"],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            })))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let result = provider
            .grounded_search(&GroundedRequest::new("is it true"))
            .await
            .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.message, json!({"fact": true}));
        assert_eq!(result.citations, vec!["https://source.one", "https://source.two"]);
        assert_eq!(result.metrics.input_tokens, 10);
        assert_eq!(result.metrics.output_tokens, 5);
        assert_eq!(result.metrics.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_grounded_sends_schema_when_requested() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "schema": { "type": "object" } }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{}" } }],
                "usage": { "prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2 }
            })))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let request =
            GroundedRequest::new("structured please").with_output_format(json!({"type": "object"}));
        let result = provider.grounded_search(&request).await.unwrap();
        assert_eq!(result.status_code, 200);
    }

    #[tokio::test]
    async fn test_grounded_rewrites_empty_content_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Message content was empty" }
            })))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let err = provider
            .grounded_search(&GroundedRequest::new(""))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        // The rewrite wins over the 400 taxonomy entry.
        assert_eq!(err.to_string(), "Content of the message is empty");
    }

    #[tokio::test]
    async fn test_grounded_other_errors_take_taxonomy_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Too many requests" }
            })))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let err = provider
            .grounded_search(&GroundedRequest::new("q"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 429);
        assert_eq!(
            err.to_string(),
            "Quota Exceeded: You have exceeded your usage limits."
        );
    }

    #[tokio::test]
    async fn test_grounded_non_json_error_body_uses_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(418).set_body_string("teapot says no"))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let err = provider
            .grounded_search(&GroundedRequest::new("q"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 418);
        assert_eq!(err.to_string(), "teapot says no");
    }
}
