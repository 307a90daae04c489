use std::sync::Arc;

use {
    anyhow::{Context, Result},
    lingua_config::LinguaConfig,
    lingua_providers::{OpenAiChat, OpenAiImages},
    lingua_routing::{Dispatcher, Router, Services},
    lingua_telegram::TelegramOutbound,
    lingua_voice::SttTranscriber,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

/// Wire backends, router and transport together and poll until Ctrl-C.
pub async fn run(config: LinguaConfig) -> Result<()> {
    let api_key = config
        .openai
        .api_key
        .clone()
        .context("OpenAI API key is not configured")?;

    let chat = OpenAiChat::new(api_key.clone())
        .with_model(config.openai.chat_model.clone())
        .with_base_url(config.openai.base_url.clone());
    let images = OpenAiImages::new(api_key.clone())
        .with_model(config.openai.image_model.clone())
        .with_size(config.openai.image_size.clone())
        .with_base_url(config.openai.base_url.clone());
    let stt = lingua_voice::build_provider(&config.voice.stt, Some(api_key))?;
    let transcriber = SttTranscriber::new(stt).with_language(config.voice.stt.language.clone());

    let bot = lingua_telegram::build_bot(&config.telegram)?;
    let telegram = Arc::new(TelegramOutbound::new(bot.clone()));

    let registry = Arc::new(config.mode_registry());
    let services = Services {
        chat: Arc::new(chat),
        images: Arc::new(images),
        transcriber: Arc::new(transcriber),
        files: Arc::clone(&telegram) as _,
        outbound: telegram,
    };
    let router = Arc::new(Router::new(
        Arc::clone(&registry),
        services,
        config.router_settings(),
    ));
    info!(
        modes = registry.len(),
        chat_model = %config.openai.chat_model,
        image_model = %config.openai.image_model,
        history_ttl_secs = config.sessions.history_ttl_secs,
        "router ready"
    );

    let cancel = CancellationToken::new();
    let dispatcher = Arc::new(Dispatcher::new(router, cancel.clone()));
    let poller = lingua_telegram::start_polling(
        &config.telegram,
        bot,
        &registry,
        Arc::clone(&dispatcher) as _,
        cancel.clone(),
    )
    .await?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("shutdown requested");
        },
        () = cancel.cancelled() => warn!("telegram polling stopped, shutting down"),
    }

    dispatcher.shutdown();
    cancel.cancel();
    poller.await.context("polling task panicked")?;
    info!(active_users = dispatcher.active_users(), "lingua stopped");
    Ok(())
}
