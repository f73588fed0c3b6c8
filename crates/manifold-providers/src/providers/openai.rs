//! First-party OpenAI adapter.
//!
//! Plain completion and grounded search both come from the shared
//! [`OpenAiCompat`] strategy — this backend is the reference member of the
//! OpenAI-compatible family.

use async_trait::async_trait;

use manifold_core::{GroundedRequest, GroundedSearchResult, ProviderError};

use crate::openai_compat::OpenAiCompat;
use crate::registry::Registration;
use crate::settings::{ProviderOptions, ProviderSettings};
use crate::traits::LlmProvider;

const NAME: &str = "openai";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub struct OpenAiProvider {
    settings: ProviderSettings,
    models: Vec<String>,
    http: OpenAiCompat,
}

impl OpenAiProvider {
    pub fn new(models: Vec<String>, options: ProviderOptions) -> Self {
        let settings =
            ProviderSettings::build(DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT, &models, options);
        OpenAiProvider {
            settings,
            models,
            http: OpenAiCompat::new(),
        }
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        catalog_key: NAME,
        ctor: |models, options| Box::new(OpenAiProvider::new(models, options)),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn models() -> Vec<String> {
        vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()]
    }

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(
            models(),
            ProviderOptions::with_api_key("test-key").base_url(server.uri()),
        )
    }

    async fn mount_completion(server: &MockServer, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": reply } }]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_defaults() {
        let provider = OpenAiProvider::new(models(), ProviderOptions::default());
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
        assert_eq!(provider.settings().model, "gpt-4o");
        assert_eq!(provider.models().len(), 2);
    }

    #[tokio::test]
    async fn test_stateless_calls_stay_single_turn() {
        let server = MockServer::start().await;
        mount_completion(&server, "first reply").await;

        let mut provider = provider_for(&server);
        provider.chat_completion("one", false).await.unwrap();
        provider.chat_completion("two", false).await.unwrap();

        // Each call re-seeds [system, user]: the second request body holds
        // exactly two messages, and nothing lingers on the instance.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(second["messages"].as_array().unwrap().len(), 2);
        assert_eq!(second["messages"][1]["content"], "two");
        assert!(provider.settings().history().is_empty());
    }

    #[tokio::test]
    async fn test_persist_accumulates_turns() {
        let server = MockServer::start().await;
        mount_completion(&server, "a reply").await;

        let mut provider = provider_for(&server);
        provider.chat_completion("one", true).await.unwrap();
        assert_eq!(provider.settings().history().len(), 3);

        provider.chat_completion("two", true).await.unwrap();

        // Second request: system, user, assistant, user.
        let requests = server.received_requests().await.unwrap();
        let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        let messages = second["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["content"], "a reply");
        assert_eq!(messages[3]["content"], "two");

        assert_eq!(provider.settings().history().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_call_leaves_user_turn_in_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let err = provider.chat_completion("doomed", false).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(provider.settings().history().len(), 2);
    }

    #[test]
    fn test_blocking_completion_matches_async() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            mount_completion(&server, "same reply").await;
            server
        });

        let mut provider = provider_for(&server);
        let blocking_reply = provider.chat_completion_blocking("hello", false).unwrap();
        assert_eq!(blocking_reply, "same reply");
        assert!(provider.settings().history().is_empty());

        let mut provider = provider_for(&server);
        let async_reply = runtime
            .block_on(provider.chat_completion("hello", false))
            .unwrap();
        assert_eq!(async_reply, blocking_reply);
    }

    #[tokio::test]
    async fn test_grounded_search_uses_responses_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": [{
                    "type": "message",
                    "content": [{ "text": "grounded reply", "annotations": [] }]
                }],
                "usage": { "input_tokens": 3, "output_tokens": 2, "total_tokens": 5 }
            })))
            .mount(&server)
            .await;

        let mut provider = provider_for(&server);
        let result = provider
            .grounded_search(&GroundedRequest::new("look this up"))
            .await
            .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.message, json!({"text": "grounded reply"}));
        assert_eq!(result.metrics.total_tokens, 5);
    }
}
