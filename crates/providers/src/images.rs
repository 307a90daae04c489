//! Image generation backend.

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    lingua_common::types::ImageRef,
    lingua_routing::ImageBackend,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    tracing::debug,
};

use crate::{
    DEFAULT_BASE_URL,
    openai_compat::{api_error_message, parse_image_urls},
    shared_http_client,
};

pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

#[derive(Clone)]
pub struct OpenAiImages {
    client: Client,
    api_key: Secret<String>,
    model: String,
    size: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiImages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImages")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("size", &self.size)
            .finish()
    }
}

impl OpenAiImages {
    #[must_use]
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            client: shared_http_client().clone(),
            api_key,
            model: DEFAULT_IMAGE_MODEL.into(),
            size: DEFAULT_IMAGE_SIZE.into(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ImageBackend for OpenAiImages {
    /// Requests exactly one image at the configured size.
    async fn generate(&self, prompt: &str) -> Result<Vec<ImageRef>> {
        let body = GenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
        };
        debug!(model = %self.model, size = %self.size, "sending image generation request");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("failed to send image generation request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "image generation request failed: {status} - {}",
                api_error_message(&body)
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .context("failed to parse image generation response")?;
        Ok(parse_image_urls(&payload)?
            .into_iter()
            .map(ImageRef::new)
            .collect())
    }
}

// ── API Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_json, header, method, path},
        },
    };

    fn backend(server: &MockServer) -> OpenAiImages {
        OpenAiImages::new(Secret::new("sk-test".into())).with_base_url(format!("{}/", server.uri()))
    }

    #[tokio::test]
    async fn requests_one_image_at_fixed_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "dall-e-2",
                "prompt": "a red fox",
                "n": 1,
                "size": "1024x1024"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1_700_000_000,
                "data": [{ "url": "https://images.example/fox.png" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let images = backend(&server).generate("a red fox").await.unwrap();
        assert_eq!(images, [ImageRef::new("https://images.example/fox.png")]);
    }

    #[tokio::test]
    async fn empty_data_yields_no_images() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "created": 1, "data": [] })))
            .mount(&server)
            .await;

        assert!(backend(&server).generate("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_prompt_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error":{"message":"Your request was rejected by the safety system.","type":"invalid_request_error"}}"#,
            ))
            .mount(&server)
            .await;

        let err = backend(&server).generate("bad").await.unwrap_err();
        assert!(err.to_string().contains("safety system"));
    }

    #[tokio::test]
    async fn custom_model_and_size_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "model": "dall-e-3",
                "prompt": "p",
                "n": 1,
                "size": "512x512"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "url": "u" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let images = backend(&server)
            .with_model("dall-e-3")
            .with_size("512x512")
            .generate("p")
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
    }
}
