//! Speech-to-Text provider abstraction and implementations.

mod whisper;

pub use whisper::{DEFAULT_WHISPER_MODEL, WhisperStt};

use {
    anyhow::{Result, bail},
    async_trait::async_trait,
    bytes::Bytes,
    lingua_common::types::AudioFormat,
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    std::sync::Arc,
};

use crate::config::SttConfig;

/// Request to transcribe audio to text.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    /// Raw audio data.
    pub audio: Bytes,
    /// Container format, used as the upload file name and MIME type.
    pub format: AudioFormat,
    /// Language hint (ISO 639-1 code, e.g., "en", "sr", "ru").
    pub language: Option<String>,
}

/// Transcription result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Detected language, when the provider reports it.
    pub language: Option<String>,
    pub duration_seconds: Option<f32>,
}

/// Speech-to-Text provider trait.
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Provider identifier (e.g., "whisper").
    fn id(&self) -> &'static str;

    /// Human-readable provider name.
    fn name(&self) -> &'static str;

    /// Check if the provider is configured and ready.
    fn is_configured(&self) -> bool;

    async fn transcribe(&self, request: TranscribeRequest) -> Result<Transcript>;
}

/// Build the configured provider.
///
/// `fallback_key` is used when the STT section carries no key of its own.
pub fn build_provider(
    config: &SttConfig,
    fallback_key: Option<Secret<String>>,
) -> Result<Arc<dyn SttProvider>> {
    match config.provider.as_str() {
        "whisper" | "openai" => {
            let api_key = config.api_key.clone().or(fallback_key);
            let mut provider = WhisperStt::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        },
        other => bail!("unsupported speech-to-text provider: {other}"),
    }
}
