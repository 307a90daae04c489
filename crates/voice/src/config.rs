//! Voice configuration types.

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

use crate::stt::DEFAULT_WHISPER_MODEL;

/// Top-level voice configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub stt: SttConfig,
}

/// Speech-to-Text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Provider id. Only "whisper" is available.
    pub provider: String,

    pub model: String,

    /// API key. Falls back to the OpenAI key when unset.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "optional_secret")]
    pub api_key: Option<Secret<String>>,

    /// API base URL override (any Whisper-compatible endpoint).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Language hint (ISO 639-1 code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: "whisper".into(),
            model: DEFAULT_WHISPER_MODEL.into(),
            api_key: None,
            base_url: None,
            language: None,
        }
    }
}

/// Serde adapter for an optional secret; an empty string reads as `None`.
mod optional_secret {
    use {
        secrecy::{ExposeSecret, Secret},
        serde::{Deserialize, Deserializer, Serializer},
    };

    pub fn serialize<S: Serializer>(
        value: &Option<Secret<String>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(secret) => serializer.serialize_some(secret.expose_secret()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Secret<String>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|key| !key.is_empty()).map(Secret::new))
    }
}
