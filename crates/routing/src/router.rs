//! Executes routing decisions against the session store and collaborators.

use {
    lingua_common::types::{AudioFormat, FileRef, UserId},
    lingua_media::{ImageLimits, normalize_image},
    lingua_sessions::{Exchange, MemorySessionStore, Session, SessionStore, UserLocks},
    std::{sync::Arc, time::Duration},
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    registry::{ModeDescriptor, ModeRegistry},
    route::{ChatInput, InboundEvent, Payload, Route, route, translation_exchanges},
    service::{ChatBackend, Clock, FileFetcher, ImageBackend, Outbound, SystemClock, Transcriber},
};

pub const DEFAULT_WELCOME: &str = "Для начала работы выберите режим.";
pub const DEFAULT_TRANSLATION_PROMPT: &str = "You are the best language translator in the world. User will provide you with text to translate.";
pub const DEFAULT_FAILURE_NOTICE: &str =
    "Не удалось обработать сообщение. Попробуйте ещё раз позже.";
/// Direct-chat history is dropped after a day of inactivity.
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(86_400);

/// Fixed user-facing texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub welcome: String,
    pub translation_prompt: String,
    pub failure_notice: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: DEFAULT_WELCOME.to_string(),
            translation_prompt: DEFAULT_TRANSLATION_PROMPT.to_string(),
            failure_notice: DEFAULT_FAILURE_NOTICE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub messages: Messages,
    pub history_ttl: Duration,
    pub image_limits: ImageLimits,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            messages: Messages::default(),
            history_ttl: DEFAULT_HISTORY_TTL,
            image_limits: ImageLimits::default(),
        }
    }
}

/// Backends and transport the router talks to.
#[derive(Clone)]
pub struct Services {
    pub chat: Arc<dyn ChatBackend>,
    pub images: Arc<dyn ImageBackend>,
    pub transcriber: Arc<dyn Transcriber>,
    pub files: Arc<dyn FileFetcher>,
    pub outbound: Arc<dyn Outbound>,
}

/// What handling an event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replied,
    Ignored,
}

pub struct Router {
    registry: Arc<ModeRegistry>,
    store: Arc<dyn SessionStore>,
    locks: UserLocks,
    services: Services,
    clock: Arc<dyn Clock>,
    settings: RouterSettings,
}

impl Router {
    pub fn new(registry: Arc<ModeRegistry>, services: Services, settings: RouterSettings) -> Self {
        Self {
            registry,
            store: Arc::new(MemorySessionStore::new()),
            locks: UserLocks::new(),
            services,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle one inbound event.
    ///
    /// The user's lock is held for the whole event, backend calls included,
    /// so events for one user never interleave. On failure the user gets the
    /// failure notice, the session keeps its previous value and the error is
    /// returned for the caller to log.
    pub async fn handle(&self, event: InboundEvent) -> Result<Outcome> {
        let InboundEvent { user_id, payload } = event;
        let kind = payload.kind();
        let _guard = self.locks.acquire(user_id).await;

        match self.process(user_id, payload).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(user_id = %user_id, %kind, error_kind = e.kind(), error = %e, "failed to handle message");
                self.reply(user_id, &self.settings.messages.failure_notice)
                    .await;
                Err(e)
            },
        }
    }

    async fn process(&self, user: UserId, payload: Payload) -> Result<Outcome> {
        let session = self.store.get(user).await?;
        let now = self.clock.now();

        let decision = self.decide(&session, &payload, now);
        let decision = match decision {
            Route::Transcribe { file, format } => {
                let transcript = self.transcribe(user, &file, format).await?;
                let payload = Payload::Transcript(transcript);
                match self.decide(&session, &payload, now) {
                    Route::Transcribe { .. } => {
                        return Err(Error::state("transcript routed to transcription again"));
                    },
                    next => next,
                }
            },
            other => other,
        };

        self.execute(user, session, decision, now).await
    }

    fn decide(&self, session: &Session, payload: &Payload, now: u64) -> Route {
        route(
            session,
            payload,
            &self.registry,
            now,
            self.settings.history_ttl,
        )
    }

    async fn execute(
        &self,
        user: UserId,
        mut session: Session,
        decision: Route,
        now: u64,
    ) -> Result<Outcome> {
        match decision {
            Route::Welcome => {
                info!(user_id = %user, "welcome sent");
                self.reply(user, &self.settings.messages.welcome).await;
                Ok(Outcome::Replied)
            },
            Route::SwitchMode(descriptor) => {
                self.switch_mode(user, session, &descriptor, now).await
            },
            Route::GenerateImage { prompt } => self.generate_image(user, &prompt).await,
            Route::Translate {
                text,
                source_language,
                target_language,
            } => {
                info!(user_id = %user, from = %source_language, to = %target_language, "translating");
                let exchanges = translation_exchanges(
                    &self.settings.messages.translation_prompt,
                    &text,
                    &source_language,
                    &target_language,
                );
                let answer = self.complete(&exchanges).await?;
                self.reply(user, &answer).await;
                Ok(Outcome::Replied)
            },
            Route::Chat {
                input,
                reset_history,
            } => {
                if reset_history {
                    info!(user_id = %user, history_len = session.history.len(), "chat history expired");
                    session.history.clear();
                }
                self.chat_turn(user, session, input, now).await
            },
            Route::Transcribe { .. } => Err(Error::state("unexpected transcription route")),
            Route::Ignore { reason } => {
                warn!(user_id = %user, mode = %session.mode, reason, "message ignored");
                Ok(Outcome::Ignored)
            },
        }
    }

    async fn switch_mode(
        &self,
        user: UserId,
        mut session: Session,
        descriptor: &ModeDescriptor,
        now: u64,
    ) -> Result<Outcome> {
        session.switch_mode(descriptor.mode.clone(), &descriptor.command, now);
        self.store.put(user, session).await?;
        info!(user_id = %user, command = %descriptor.command, mode = %descriptor.mode, "mode switched");
        self.reply(user, &descriptor.text).await;
        Ok(Outcome::Replied)
    }

    async fn generate_image(&self, user: UserId, prompt: &str) -> Result<Outcome> {
        info!(user_id = %user, prompt, "generating image");
        let images = self
            .services
            .images
            .generate(prompt)
            .await
            .map_err(|e| Error::backend("image", e))?;
        let image = images
            .into_iter()
            .next()
            .ok_or_else(|| Error::empty_response("image", "no images returned"))?;

        if let Err(e) = self.services.outbound.send_image(user, &image).await {
            warn!(user_id = %user, error = %e, "failed to send image");
        } else {
            info!(user_id = %user, image = %image, "image sent");
        }
        Ok(Outcome::Replied)
    }

    async fn transcribe(&self, user: UserId, file: &FileRef, format: AudioFormat) -> Result<String> {
        info!(user_id = %user, format = format.extension(), "transcribing voice message");
        let audio = self.fetch(file).await?;
        let transcript = self
            .services
            .transcriber
            .transcribe(audio, format)
            .await
            .map_err(|e| Error::backend("transcription", e))?;
        info!(user_id = %user, transcript = %transcript, "voice message recognized");
        self.reply(user, &format!("{transcript}\n*** Recognized text ***"))
            .await;
        Ok(transcript)
    }

    async fn chat_turn(
        &self,
        user: UserId,
        mut session: Session,
        input: ChatInput,
        now: u64,
    ) -> Result<Outcome> {
        let entry = match input {
            ChatInput::Text(text) => Exchange::user(text),
            ChatInput::Image(file) => {
                let bytes = self.fetch(&file).await?;
                let limits = self.settings.image_limits;
                let normalized = tokio::task::spawn_blocking(move || normalize_image(&bytes, limits))
                    .await
                    .map_err(|e| Error::state(format!("image normalization task failed: {e}")))??;
                let (attachment, summary) = normalized.into_parts();
                info!(user_id = %user, %summary, "image attached");
                Exchange::user_image(attachment)
            },
        };

        let mut history = std::mem::take(&mut session.history);
        history.push(entry);
        let sent = history.len();
        info!(user_id = %user, history_len = sent, "chat turn");

        let answer = self.complete(&history).await?;
        history.push(Exchange::assistant(answer.as_str()));
        session.commit_history(history, now);
        self.store.put(user, session).await?;

        let reply = if sent > 1 {
            format!("{answer}\n\n*** Used history with last {sent} messages ***")
        } else {
            answer
        };
        self.reply(user, &reply).await;
        Ok(Outcome::Replied)
    }

    async fn complete(&self, exchanges: &[Exchange]) -> Result<String> {
        let answer = self
            .services
            .chat
            .complete(exchanges)
            .await
            .map_err(|e| Error::backend("chat", e))?;
        debug!(exchanges = exchanges.len(), answer_len = answer.len(), "chat completion received");
        Ok(answer)
    }

    async fn fetch(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.services
            .files
            .fetch(file)
            .await
            .map_err(|e| Error::fetch(file.as_str(), e))
    }

    /// Delivery is fire-and-forget: failures are logged, never propagated.
    async fn reply(&self, user: UserId, text: &str) {
        if let Err(e) = self.services.outbound.send_text(user, text).await {
            warn!(user_id = %user, error = %e, "failed to send reply");
        }
    }
}
