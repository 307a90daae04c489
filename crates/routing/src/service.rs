//! Collaborators the router calls out to.
//!
//! Implementations live in the provider, voice and transport crates; the
//! router only sees these traits.

use {
    anyhow::Result,
    async_trait::async_trait,
    lingua_common::types::{AudioFormat, FileRef, ImageRef, UserId},
    lingua_sessions::Exchange,
    std::time::{SystemTime, UNIX_EPOCH},
};

/// Multi-turn language model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Complete an ordered exchange list, returning the assistant's text.
    async fn complete(&self, exchanges: &[Exchange]) -> Result<String>;
}

/// Text-to-image model.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Generate images for a prompt. Zero or one reference is expected.
    async fn generate(&self, prompt: &str) -> Result<Vec<ImageRef>>;
}

/// Speech-to-text service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, format: AudioFormat) -> Result<String>;
}

/// Resolves transport file references into bytes.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, file: &FileRef) -> Result<Vec<u8>>;
}

/// Delivery of replies to a user.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_text(&self, user: UserId, text: &str) -> Result<()>;
    async fn send_image(&self, user: UserId, image: &ImageRef) -> Result<()>;
}

/// Source of the current time in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}
