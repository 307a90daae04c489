use {
    anyhow::{Result, bail},
    async_trait::async_trait,
    bytes::Bytes,
    lingua_common::types::AudioFormat,
    lingua_routing::Transcriber,
    std::sync::Arc,
    tracing::debug,
};

use crate::stt::{SttProvider, TranscribeRequest};

/// Exposes an [`SttProvider`] to the router.
#[derive(Clone)]
pub struct SttTranscriber {
    provider: Arc<dyn SttProvider>,
    language: Option<String>,
}

impl SttTranscriber {
    pub fn new(provider: Arc<dyn SttProvider>) -> Self {
        Self {
            provider,
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

#[async_trait]
impl Transcriber for SttTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, format: AudioFormat) -> Result<String> {
        if !self.provider.is_configured() {
            bail!("{} is not configured", self.provider.name());
        }
        let bytes = audio.len();
        let transcript = self
            .provider
            .transcribe(TranscribeRequest {
                audio: Bytes::from(audio),
                format,
                language: self.language.clone(),
            })
            .await?;
        debug!(
            provider = self.provider.id(),
            bytes,
            language = transcript.language.as_deref().unwrap_or("unknown"),
            "audio transcribed"
        );
        if transcript.text.is_empty() {
            bail!("transcription returned no text");
        }
        Ok(transcript.text)
    }
}
