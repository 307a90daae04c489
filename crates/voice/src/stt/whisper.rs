//! OpenAI Whisper transcription over `/audio/transcriptions`.

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    reqwest::{
        Client,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use super::{SttProvider, TranscribeRequest, Transcript};

const API_BASE: &str = "https://api.openai.com/v1";

/// Default Whisper model.
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";

#[derive(Clone)]
pub struct WhisperStt {
    client: Client,
    api_key: Option<Secret<String>>,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for WhisperStt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperStt")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WhisperStt {
    /// A provider without a key reports itself unconfigured and refuses to
    /// transcribe.
    #[must_use]
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_WHISPER_MODEL.into(),
            base_url: API_BASE.into(),
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

    fn form(&self, request: TranscribeRequest) -> Result<Form> {
        let file = Part::bytes(request.audio.to_vec())
            .file_name(format!("voice_message.{}", request.format.extension()))
            .mime_str(request.format.mime_type())
            .context("invalid audio mime type")?;

        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");
        Ok(match request.language {
            Some(language) => form.text("language", language),
            None => form,
        })
    }
}

#[async_trait]
impl SttProvider for WhisperStt {
    fn id(&self) -> &'static str {
        "whisper"
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn transcribe(&self, request: TranscribeRequest) -> Result<Transcript> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("whisper api key is not configured"))?;
        let format = request.format;
        let form = self.form(request)?;
        debug!(model = %self.model, format = format.extension(), "uploading audio for transcription");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .context("failed to send transcription request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("transcription request failed: {status} - {body}"));
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .context("failed to parse transcription response")?;
        Ok(Transcript {
            text: parsed.text.trim().to_string(),
            language: parsed.language,
            duration_seconds: parsed.duration,
        })
    }
}

/// `verbose_json` response body; only the fields we keep.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f32>,
}
