use {
    anyhow::Result,
    async_trait::async_trait,
    lingua_common::types::{FileRef, ImageRef, UserId},
    lingua_routing::{FileFetcher, Outbound},
    std::{future::Future, time::Duration},
    teloxide::{
        RequestError,
        prelude::*,
        types::{ChatId, InputFile},
    },
    tracing::{debug, info, warn},
};

use crate::{
    chunk::{TELEGRAM_MAX_MESSAGE_LEN, chunk_message},
    error::Error,
};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends replies and downloads attachments through the Bot API.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
    client: reqwest::Client,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            client: reqwest::Client::new(),
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Download URL for a file path returned by `getFile`.
    fn file_url(&self, path: &str) -> String {
        let api_url = self.bot.api_url();
        format!(
            "{}/file/bot{}/{}",
            api_url.as_str().trim_end_matches('/'),
            self.bot.token(),
            path
        )
    }

    /// Resolve a Telegram `file_id` into the file's bytes.
    pub async fn download(&self, file: &FileRef) -> crate::Result<Vec<u8>> {
        let info = run_with_retry(None, "get file", || self.bot.get_file(file.as_str()).send())
            .await?;

        let response = self.client.get(self.file_url(&info.path)).send().await?;
        if !response.status().is_success() {
            return Err(Error::Download {
                status: response.status(),
            });
        }

        let data = response.bytes().await?.to_vec();
        debug!(file_id = %file, bytes = data.len(), "downloaded telegram file");
        Ok(data)
    }
}

/// Run a Bot API request, waiting out `RetryAfter` rate limits a bounded
/// number of times.
async fn run_with_retry<T, F, Fut>(
    user: Option<UserId>,
    operation: &'static str,
    mut request: F,
) -> std::result::Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        user_id = ?user,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    user_id = ?user,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[async_trait]
impl Outbound for TelegramOutbound {
    async fn send_text(&self, user: UserId, text: &str) -> Result<()> {
        let chat_id = ChatId(user.0);
        let chunks = chunk_message(text, TELEGRAM_MAX_MESSAGE_LEN);
        info!(
            user_id = %user,
            text_len = text.len(),
            chunk_count = chunks.len(),
            "telegram outbound text send start"
        );

        for chunk in &chunks {
            run_with_retry(Some(user), "send message", || {
                self.bot.send_message(chat_id, chunk.as_str()).send()
            })
            .await?;
        }
        Ok(())
    }

    async fn send_image(&self, user: UserId, image: &ImageRef) -> Result<()> {
        let chat_id = ChatId(user.0);
        let input = InputFile::url(image.as_str().parse()?);
        run_with_retry(Some(user), "send photo", || {
            self.bot.send_photo(chat_id, input.clone()).send()
        })
        .await?;
        info!(user_id = %user, "telegram outbound photo sent");
        Ok(())
    }
}

#[async_trait]
impl FileFetcher for TelegramOutbound {
    async fn fetch(&self, file: &FileRef) -> Result<Vec<u8>> {
        Ok(self.download(file).await?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_api::MockTelegramApi,
        std::sync::atomic::{AtomicUsize, Ordering},
        teloxide::types::Seconds,
    };

    fn rate_limited() -> RequestError {
        RequestError::RetryAfter(Seconds::from_seconds(0))
    }

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[tokio::test]
    async fn retries_until_rate_limit_clears() {
        let attempts = AtomicUsize::new(0);
        let result = run_with_retry(Some(UserId(1)), "test", || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(rate_limited())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_retries() {
        let attempts = AtomicUsize::new(0);
        let result: std::result::Result<(), _> = run_with_retry(None, "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;
        assert!(matches!(result, Err(RequestError::RetryAfter(_))));
        assert_eq!(
            attempts.load(Ordering::SeqCst),
            TELEGRAM_RETRY_AFTER_MAX_RETRIES + 1
        );
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: std::result::Result<(), _> = run_with_retry(None, "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RequestError::Io(std::io::Error::other("boom"))) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_text_targets_the_user_chat() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        outbound.send_text(UserId(42), "Zdravo!").await.unwrap();

        let sent = api.sent_messages();
        assert_eq!(sent, vec![(42, "Zdravo!".to_string())]);
        api.shutdown().await;
    }

    #[tokio::test]
    async fn long_text_is_split_into_several_messages() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());
        let text = "слово ".repeat(1000);

        outbound.send_text(UserId(7), &text).await.unwrap();

        let sent = api.sent_messages();
        assert!(sent.len() > 1, "expected chunked delivery, got {}", sent.len());
        assert!(sent.iter().all(|(chat, chunk)| *chat == 7
            && chunk.len() <= TELEGRAM_MAX_MESSAGE_LEN));
        api.shutdown().await;
    }

    #[tokio::test]
    async fn send_image_posts_photo_by_url() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        outbound
            .send_image(UserId(42), &ImageRef::new("https://images.example/cat.png"))
            .await
            .unwrap();

        let photos = api.calls("SendPhoto");
        assert_eq!(photos.len(), 1);
        assert!(photos[0].contains("https://images.example/cat.png"));
        api.shutdown().await;
    }

    #[tokio::test]
    async fn send_image_rejects_invalid_reference() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        let result = outbound.send_image(UserId(42), &ImageRef::new("not a url")).await;
        assert!(result.is_err());
        assert!(api.calls("SendPhoto").is_empty());
        api.shutdown().await;
    }

    #[tokio::test]
    async fn fetch_downloads_file_bytes() {
        let api = MockTelegramApi::start().await;
        api.insert_file("voice-file-id", b"OggS voice".to_vec());
        let outbound = TelegramOutbound::new(api.bot());

        let data = outbound.fetch(&FileRef::new("voice-file-id")).await.unwrap();
        assert_eq!(data, b"OggS voice");
        assert_eq!(api.calls("GetFile").len(), 1);
        api.shutdown().await;
    }

    #[tokio::test]
    async fn fetch_reports_missing_file() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        let err = outbound.download(&FileRef::new("gone")).await.unwrap_err();
        assert!(matches!(err, Error::Download { status } if status.as_u16() == 404));
        api.shutdown().await;
    }
}
