use std::{sync::Arc, time::Duration};

use {
    lingua_routing::ModeRegistry,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    config::TelegramConfig,
    error::{Error, Result},
    handlers::{self, InboundSink},
};

/// Extra time the HTTP client waits beyond the long-polling timeout.
const CLIENT_TIMEOUT_MARGIN_SECS: u64 = 15;

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Build a bot whose HTTP client outlives the long-polling timeout.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    if !config.has_token() {
        return Err(Error::message("telegram bot token is not configured"));
    }
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(
            u64::from(config.poll_timeout_secs) + CLIENT_TIMEOUT_MARGIN_SECS,
        ))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Mode commands as Telegram autocomplete entries.
pub fn bot_commands(registry: &ModeRegistry) -> Vec<BotCommand> {
    registry
        .iter()
        .map(|mode| BotCommand::new(mode.command_name(), mode.text.clone()))
        .collect()
}

/// Verify credentials, clear any webhook and publish the command list.
///
/// Returns the bot's username.
pub async fn connect(
    bot: &Bot,
    registry: &ModeRegistry,
    register_commands: bool,
) -> Result<Option<String>> {
    let me = bot.get_me().send().await?;
    let bot_username = me.username.clone();

    // Long polling is refused while a webhook is set.
    bot.delete_webhook().send().await?;

    if register_commands {
        let commands = bot_commands(registry);
        let count = commands.len();
        match bot.set_my_commands(commands).send().await {
            Ok(_) => debug!(count, "registered telegram bot commands"),
            Err(e) => warn!("failed to register bot commands: {e}"),
        }
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");
    Ok(bot_username)
}

/// Long-poll `getUpdates` until `cancel` fires, handing messages to `sink`.
///
/// Another poller on the same token stops the loop and cancels `cancel`.
pub async fn poll(
    bot: Bot,
    sink: Arc<dyn InboundSink>,
    poll_timeout_secs: u32,
    cancel: CancellationToken,
) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .send();
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = request => result,
        };

        match result {
            Ok(updates) => {
                if !updates.is_empty() {
                    debug!(count = updates.len(), "got telegram updates");
                }
                for update in updates {
                    offset = update.id.as_offset();
                    handlers::handle_update(update, sink.as_ref());
                }
            },
            Err(e) => {
                if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                    warn!(
                        "telegram bot disabled: another instance is already running with this token"
                    );
                    cancel.cancel();
                    break;
                }

                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
}

/// Connect the bot and spawn the polling loop.
pub async fn start_polling(
    config: &TelegramConfig,
    bot: Bot,
    registry: &ModeRegistry,
    sink: Arc<dyn InboundSink>,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    connect(&bot, registry, config.register_commands).await?;
    Ok(tokio::spawn(poll(
        bot,
        sink,
        config.poll_timeout_secs,
        cancel,
    )))
}
