//! Chat Completions backend.

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    lingua_routing::ChatBackend,
    lingua_sessions::Exchange,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde_json::json,
    tracing::debug,
};

use crate::{
    DEFAULT_BASE_URL,
    openai_compat::{api_error_message, parse_completion_text, to_openai_messages},
    shared_http_client,
};

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone)]
pub struct OpenAiChat {
    client: Client,
    api_key: Secret<String>,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiChat {
    #[must_use]
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            client: shared_http_client().clone(),
            api_key,
            model: DEFAULT_CHAT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for OpenAiChat {
    async fn complete(&self, exchanges: &[Exchange]) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": to_openai_messages(exchanges),
        });
        debug!(model = %self.model, messages = exchanges.len(), "sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "chat completion request failed: {status} - {}",
                api_error_message(&body)
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .context("failed to parse chat completion response")?;
        parse_completion_text(&payload)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        lingua_media::{Attachment, DetailLevel},
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_partial_json, header, method, path},
        },
    };

    fn backend(server: &MockServer) -> OpenAiChat {
        OpenAiChat::new(Secret::new("sk-test".into())).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn sends_model_and_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "persona" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "Zdravo" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = backend(&server)
            .complete(&[Exchange::system("persona"), Exchange::user("hello")])
            .await
            .unwrap();
        assert_eq!(answer, "Zdravo");
    }

    #[tokio::test]
    async fn sends_images_as_data_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [{
                    "role": "user",
                    "content": [{
                        "type": "image_url",
                        "image_url": { "url": "data:image/png;base64,AAAA", "detail": "high" }
                    }]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "a cat" } }]
            })))
            .mount(&server)
            .await;

        let answer = backend(&server)
            .with_model("gpt-4o")
            .complete(&[Exchange::user_image(Attachment {
                data: "AAAA".into(),
                detail: DetailLevel::High,
            })])
            .await
            .unwrap();
        assert_eq!(answer, "a cat");
    }

    #[tokio::test]
    async fn error_status_surfaces_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#,
            ))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete(&[Exchange::user("hi")])
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("401"), "{message}");
        assert!(message.contains("Incorrect API key provided"), "{message}");
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        assert!(backend(&server).complete(&[Exchange::user("hi")]).await.is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let chat = OpenAiChat::new(Secret::new("sk-secret".into()));
        let debug = format!("{chat:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(chat.model(), DEFAULT_CHAT_MODEL);
    }
}
