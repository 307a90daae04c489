//! Catalog of selectable modes keyed by command token.

use {
    lingua_sessions::Mode,
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, sync::Arc},
};

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    /// Command token, including the leading slash (`/ensrb`).
    pub command: String,
    /// Acknowledgement sent when the mode is selected; also the command
    /// description registered with the transport.
    pub text: String,
    #[serde(flatten)]
    pub mode: Mode,
}

impl ModeDescriptor {
    pub fn translator(
        command: &str,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        Self {
            command: command.to_string(),
            text: text.to_string(),
            mode: Mode::Translator {
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
            },
        }
    }

    pub fn new(command: &str, text: &str, mode: Mode) -> Self {
        Self {
            command: command.to_string(),
            text: text.to_string(),
            mode,
        }
    }

    /// Command token without the leading slash.
    #[must_use]
    pub fn command_name(&self) -> &str {
        self.command.trim_start_matches('/')
    }
}

/// The entries the bot ships with.
#[must_use]
pub fn default_modes() -> Vec<ModeDescriptor> {
    vec![
        ModeDescriptor::translator(
            "/rusrb",
            "Режим перевода с русского на сербский",
            "russian",
            "serbian",
        ),
        ModeDescriptor::translator(
            "/srbru",
            "Режим перевода с сербского на русский",
            "serbian",
            "russian",
        ),
        ModeDescriptor::translator(
            "/ensrb",
            "Translation mode from English to Serbian",
            "english",
            "serbian",
        ),
        ModeDescriptor::translator(
            "/srben",
            "Translation mode from Serbian to English",
            "serbian",
            "english",
        ),
        ModeDescriptor::new(
            "/chatgpt",
            "Чат с ботом напрямую (ChatGPT 4o mini)",
            Mode::DirectChat,
        ),
        ModeDescriptor::new(
            "/image",
            "Сгенерировать изображение (Dall-E 2)",
            Mode::ImageGeneration,
        ),
    ]
}

/// Immutable lookup table built once at startup.
///
/// Iteration keeps insertion order so the command list shown to users is
/// stable. Inserting a token that already exists replaces the descriptor in
/// place.
#[derive(Debug, Clone, Default)]
pub struct ModeRegistry {
    by_command: HashMap<String, Arc<ModeDescriptor>>,
    order: Vec<Arc<ModeDescriptor>>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.extend(default_modes());
        registry
    }

    pub fn insert(&mut self, descriptor: ModeDescriptor) {
        let descriptor = Arc::new(descriptor);
        if let Some(slot) = self
            .order
            .iter_mut()
            .find(|d| d.command == descriptor.command)
        {
            *slot = Arc::clone(&descriptor);
        } else {
            self.order.push(Arc::clone(&descriptor));
        }
        self.by_command
            .insert(descriptor.command.clone(), descriptor);
    }

    pub fn extend(&mut self, descriptors: impl IntoIterator<Item = ModeDescriptor>) {
        for descriptor in descriptors {
            self.insert(descriptor);
        }
    }

    /// Exact match on the command token.
    #[must_use]
    pub fn lookup(&self, command: &str) -> Option<&Arc<ModeDescriptor>> {
        self.by_command.get(command)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModeDescriptor> {
        self.order.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
