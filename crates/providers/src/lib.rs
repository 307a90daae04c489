//! OpenAI-backed chat and image-generation backends.

pub mod chat;
pub mod images;
pub mod openai_compat;

pub use {chat::OpenAiChat, images::OpenAiImages};

/// OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Shared HTTP client for the backends.
///
/// Reusing one client shares the connection pool and TLS sessions between
/// chat and image requests.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
