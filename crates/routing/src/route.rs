//! The routing decision for one inbound event.
//!
//! [`route`] is total and side-effect free: it inspects the session and the
//! payload and names what should happen. The [`crate::Router`] executes it.

use {
    lingua_common::types::{AudioFormat, ContentKind, FileRef, UserId},
    lingua_sessions::{Exchange, Mode, Session},
    std::{sync::Arc, time::Duration},
};

use crate::registry::{ModeDescriptor, ModeRegistry};

/// Token that always answers with the welcome text.
pub const START_COMMAND: &str = "/start";

/// Inbound event as produced by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub payload: Payload,
}

impl InboundEvent {
    pub fn new(user_id: impl Into<UserId>, payload: Payload) -> Self {
        Self {
            user_id: user_id.into(),
            payload,
        }
    }

    pub fn text(user_id: impl Into<UserId>, text: impl Into<String>) -> Self {
        Self::new(user_id, Payload::Text(text.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Photo(FileRef),
    Document(FileRef),
    Voice(FileRef),
    Audio { file: FileRef, format: AudioFormat },
    /// Text recovered from a voice or audio payload. Never produced by a
    /// transport; bypasses command matching.
    Transcript(String),
}

impl Payload {
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) | Self::Transcript(_) => ContentKind::Text,
            Self::Photo(_) => ContentKind::Photo,
            Self::Document(_) => ContentKind::Document,
            Self::Voice(_) => ContentKind::Voice,
            Self::Audio { .. } => ContentKind::Audio,
        }
    }

    /// Text carried by the payload, whether typed or transcribed.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Transcript(text) => Some(text),
            _ => None,
        }
    }
}

/// New user turn for a direct chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Text(String),
    Image(FileRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Reply with the welcome text; no state change.
    Welcome,
    /// Enter the descriptor's mode and acknowledge.
    SwitchMode(Arc<ModeDescriptor>),
    GenerateImage {
        prompt: String,
    },
    /// Transcribe first, then route the transcript.
    Transcribe {
        file: FileRef,
        format: AudioFormat,
    },
    Translate {
        text: String,
        source_language: String,
        target_language: String,
    },
    Chat {
        input: ChatInput,
        /// Stored history is stale and must be dropped before this turn.
        reset_history: bool,
    },
    Ignore {
        reason: &'static str,
    },
}

impl Route {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::SwitchMode(_) => "switch_mode",
            Self::GenerateImage { .. } => "generate_image",
            Self::Transcribe { .. } => "transcribe",
            Self::Translate { .. } => "translate",
            Self::Chat { .. } => "chat",
            Self::Ignore { .. } => "ignore",
        }
    }
}

/// Decide what to do with `payload` for a user in `session`.
///
/// Precedence: `/start`, mode commands, welcome for users without a mode,
/// image generation, transcription, then the translator or chat turn.
#[must_use]
pub fn route(
    session: &Session,
    payload: &Payload,
    registry: &ModeRegistry,
    now: u64,
    history_ttl: Duration,
) -> Route {
    if let Payload::Text(text) = payload {
        if text == START_COMMAND {
            return Route::Welcome;
        }
        if let Some(descriptor) = registry.lookup(text) {
            return Route::SwitchMode(Arc::clone(descriptor));
        }
    }

    match &session.mode {
        Mode::Unset => Route::Welcome,
        Mode::ImageGeneration => match payload.text() {
            Some(prompt) => Route::GenerateImage {
                prompt: prompt.to_string(),
            },
            None => Route::Ignore {
                reason: "image generation needs a text prompt",
            },
        },
        mode => match payload {
            Payload::Voice(file) => Route::Transcribe {
                file: file.clone(),
                format: AudioFormat::Ogg,
            },
            Payload::Audio { file, format } => Route::Transcribe {
                file: file.clone(),
                format: *format,
            },
            _ => route_turn(session, mode, payload, now, history_ttl),
        },
    }
}

fn route_turn(
    session: &Session,
    mode: &Mode,
    payload: &Payload,
    now: u64,
    history_ttl: Duration,
) -> Route {
    match mode {
        Mode::Translator {
            source_language,
            target_language,
        } => match payload.text() {
            Some(text) => Route::Translate {
                text: text.to_string(),
                source_language: source_language.clone(),
                target_language: target_language.clone(),
            },
            None => Route::Ignore {
                reason: "translator accepts text only",
            },
        },
        Mode::DirectChat => {
            let input = match payload {
                Payload::Text(text) | Payload::Transcript(text) => ChatInput::Text(text.clone()),
                Payload::Photo(file) | Payload::Document(file) => ChatInput::Image(file.clone()),
                Payload::Voice(_) | Payload::Audio { .. } => {
                    return Route::Ignore {
                        reason: "audio reached chat without transcription",
                    };
                },
            };
            Route::Chat {
                input,
                reset_history: session.history_expired(now, history_ttl),
            }
        },
        Mode::Unset | Mode::ImageGeneration => Route::Ignore {
            reason: "unknown mode",
        },
    }
}

/// Exchange list for one translation request.
#[must_use]
pub fn translation_exchanges(
    persona: &str,
    text: &str,
    source_language: &str,
    target_language: &str,
) -> Vec<Exchange> {
    vec![
        Exchange::system(persona),
        Exchange::user(format!(
            "Translate text in angle brackets from {source_language} to {target_language}: <{text}>"
        )),
    ]
}
