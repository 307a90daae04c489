//! Config schema: transport, backends, session policy, media limits, texts
//! and the mode catalog.

use std::time::Duration;

use {
    lingua_media::{ImageLimits, image_ops},
    lingua_providers::{
        DEFAULT_BASE_URL,
        chat::DEFAULT_CHAT_MODEL,
        images::{DEFAULT_IMAGE_MODEL, DEFAULT_IMAGE_SIZE},
    },
    lingua_routing::{Messages, ModeDescriptor, ModeRegistry, RouterSettings, router},
    lingua_telegram::TelegramConfig,
    lingua_voice::VoiceConfig,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinguaConfig {
    pub telegram: TelegramConfig,
    pub openai: OpenAiConfig,
    pub voice: VoiceConfig,
    pub sessions: SessionsConfig,
    pub media: MediaConfig,
    pub messages: MessagesConfig,
    /// Extra or overriding entries merged over the built-in mode catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modes: Vec<ModeDescriptor>,
}

impl LinguaConfig {
    /// Built-in catalog with the configured entries merged over it.
    #[must_use]
    pub fn mode_registry(&self) -> ModeRegistry {
        let mut registry = ModeRegistry::with_defaults();
        registry.extend(self.modes.iter().cloned());
        registry
    }

    #[must_use]
    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            messages: self.messages.to_messages(),
            history_ttl: Duration::from_secs(self.sessions.history_ttl_secs),
            image_limits: self.media.limits(),
        }
    }
}

/// OpenAI-compatible API used for chat, translation and image generation.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        deserialize_with = "deserialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,

    pub base_url: String,

    /// Model used for direct chat and translation.
    pub chat_model: String,

    pub image_model: String,

    /// Requested size of generated images, e.g. `1024x1024`.
    pub image_size: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            chat_model: DEFAULT_CHAT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            image_size: DEFAULT_IMAGE_SIZE.into(),
        }
    }
}

impl OpenAiConfig {
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Seconds of inactivity after which direct-chat history is dropped.
    pub history_ttl_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            history_ttl_secs: router::DEFAULT_HISTORY_TTL.as_secs(),
        }
    }
}

/// Image normalization limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Longest side, in pixels, an inbound image is downscaled to.
    pub max_dimension: u32,
    /// Images whose longest side exceeds this are sent with high detail.
    pub detail_threshold: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_dimension: image_ops::MAX_DIMENSION,
            detail_threshold: image_ops::DETAIL_THRESHOLD,
        }
    }
}

impl MediaConfig {
    #[must_use]
    pub fn limits(&self) -> ImageLimits {
        ImageLimits {
            max_dimension: self.max_dimension,
            detail_threshold: self.detail_threshold,
        }
    }
}

/// User-facing texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Reply to `/start` and to anything sent before a mode is chosen.
    pub welcome: String,
    /// System prompt for translation requests.
    pub translation_prompt: String,
    /// Reply when an event could not be processed.
    pub failure_notice: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        let defaults = Messages::default();
        Self {
            welcome: defaults.welcome,
            translation_prompt: defaults.translation_prompt,
            failure_notice: defaults.failure_notice,
        }
    }
}

impl MessagesConfig {
    #[must_use]
    pub fn to_messages(&self) -> Messages {
        Messages {
            welcome: self.welcome.clone(),
            translation_prompt: self.translation_prompt.clone(),
            failure_notice: self.failure_notice.clone(),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_option_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.is_empty()).map(Secret::new))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, lingua_sessions::Mode};

    #[test]
    fn defaults_match_deployed_bot() {
        let config = LinguaConfig::default();
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.openai.chat_model, "gpt-4o-mini");
        assert_eq!(config.openai.image_model, "dall-e-2");
        assert_eq!(config.openai.image_size, "1024x1024");
        assert_eq!(config.sessions.history_ttl_secs, 86_400);
        assert_eq!(config.media.max_dimension, 1024);
        assert_eq!(config.media.detail_threshold, 512);
        assert_eq!(config.messages.welcome, "Для начала работы выберите режим.");
        assert!(config.modes.is_empty());
    }

    #[test]
    fn router_settings_reflect_config() {
        let mut config = LinguaConfig::default();
        config.sessions.history_ttl_secs = 60;
        config.media.max_dimension = 800;
        config.messages.welcome = "Choose a mode".into();

        let settings = config.router_settings();
        assert_eq!(settings.history_ttl, Duration::from_secs(60));
        assert_eq!(settings.image_limits.max_dimension, 800);
        assert_eq!(settings.image_limits.detail_threshold, 512);
        assert_eq!(settings.messages.welcome, "Choose a mode");
    }

    #[test]
    fn configured_modes_extend_and_override_defaults() {
        let config: LinguaConfig = serde_json::from_value(serde_json::json!({
            "modes": [
                {
                    "command": "/deru",
                    "text": "German to Russian",
                    "mode": "translator",
                    "source_language": "german",
                    "target_language": "russian"
                },
                { "command": "/chatgpt", "text": "Talk to me", "mode": "direct_chat" }
            ]
        }))
        .unwrap();

        let registry = config.mode_registry();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.lookup("/chatgpt").unwrap().text, "Talk to me");
        assert_eq!(registry.lookup("/deru").unwrap().mode, Mode::Translator {
            source_language: "german".into(),
            target_language: "russian".into(),
        });
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = OpenAiConfig {
            api_key: Some(Secret::new("sk-secret-value".into())),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret-value"));
    }

    #[test]
    fn empty_api_key_is_missing() {
        let config: OpenAiConfig = serde_json::from_str(r#"{"api_key": ""}"#).unwrap();
        assert!(config.api_key.is_none());
        assert!(!config.has_api_key());
    }
}
