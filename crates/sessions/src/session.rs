use {
    serde::{Deserialize, Serialize},
    std::time::Duration,
};

use crate::message::Exchange;

/// Conversational capability a user has selected.
///
/// Translator parameters travel with the variant, so they are only present
/// while the translator is active and change only on the next switch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    /// No mode chosen yet.
    #[default]
    Unset,
    Translator {
        source_language: String,
        target_language: String,
    },
    DirectChat,
    ImageGeneration,
}

impl Mode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Translator { .. } => "translator",
            Self::DirectChat => "direct_chat",
            Self::ImageGeneration => "image_generation",
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Translator {
                source_language,
                target_language,
            } => write!(f, "translator({source_language}->{target_language})"),
            other => f.write_str(other.name()),
        }
    }
}

/// State kept for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub mode: Mode,
    /// Command token that selected the current mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Direct-chat history; empty in every other mode.
    #[serde(default)]
    pub history: Vec<Exchange>,
    /// Unix seconds of the last mode switch or direct-chat turn.
    #[serde(default)]
    pub last_activity: u64,
}

impl Session {
    /// Enter `mode`, dropping any history.
    pub fn switch_mode(&mut self, mode: Mode, command: impl Into<String>, now: u64) {
        self.mode = mode;
        self.command = Some(command.into());
        self.history.clear();
        self.last_activity = now;
    }

    /// History is stale when it is non-empty and the session has been idle
    /// for longer than `ttl`.
    #[must_use]
    pub fn history_expired(&self, now: u64, ttl: Duration) -> bool {
        !self.history.is_empty() && now > self.last_activity.saturating_add(ttl.as_secs())
    }

    /// Replace the history with a completed turn.
    pub fn commit_history(&mut self, history: Vec<Exchange>, now: u64) {
        self.history = history;
        self.last_activity = now;
    }
}
