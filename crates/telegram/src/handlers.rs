use {
    lingua_common::types::{AudioFormat, FileRef, UserId},
    lingua_routing::{Dispatcher, InboundEvent, Payload},
    teloxide::types::{MediaKind, Message, MessageKind, Update, UpdateKind},
    tracing::{debug, info},
};

/// Receiver of converted inbound events.
pub trait InboundSink: Send + Sync {
    fn submit(&self, event: InboundEvent);
}

impl InboundSink for Dispatcher {
    fn submit(&self, event: InboundEvent) {
        Dispatcher::submit(self, event);
    }
}

/// Convert one polled update and hand it to the sink.
pub fn handle_update(update: Update, sink: &dyn InboundSink) {
    match update.kind {
        UpdateKind::Message(msg) => handle_message(&msg, sink),
        other => debug!("ignoring non-message update: {other:?}"),
    }
}

pub fn handle_message(msg: &Message, sink: &dyn InboundSink) {
    let Some(user_id) = sender_id(msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without a sender");
        return;
    };

    match extract_payload(msg) {
        Some(payload) => {
            debug!(
                user_id = %user_id,
                kind = %payload.kind(),
                "received telegram message"
            );
            sink.submit(InboundEvent::new(user_id, payload));
        },
        None => info!(
            user_id = %user_id,
            media = describe_media_kind(msg).unwrap_or("service message"),
            "ignoring unsupported telegram content"
        ),
    }
}

/// Telegram account id of the sender.
fn sender_id(msg: &Message) -> Option<UserId> {
    let user = msg.from.as_ref()?;
    i64::try_from(user.id.0).ok().map(UserId)
}

/// Map a message onto the payload kinds the router understands.
///
/// Captions are dropped; photos use the largest size Telegram offers.
pub fn extract_payload(msg: &Message) -> Option<Payload> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    match &common.media_kind {
        MediaKind::Text(t) => Some(Payload::Text(t.text.clone())),
        MediaKind::Photo(p) => p
            .photo
            .iter()
            .max_by_key(|size| u64::from(size.width) * u64::from(size.height))
            .map(|size| Payload::Photo(FileRef::new(size.file.id.clone()))),
        MediaKind::Document(d) => Some(Payload::Document(FileRef::new(d.document.file.id.clone()))),
        MediaKind::Voice(v) => Some(Payload::Voice(FileRef::new(v.voice.file.id.clone()))),
        MediaKind::Audio(a) => Some(Payload::Audio {
            file: FileRef::new(a.audio.file.id.clone()),
            format: a
                .audio
                .mime_type
                .as_ref()
                .map(|mime| AudioFormat::from_mime(mime.as_ref()))
                .unwrap_or(AudioFormat::Mp3),
        }),
        _ => None,
    }
}

/// Describe a media kind for logging purposes.
fn describe_media_kind(msg: &Message) -> Option<&'static str> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(_) => None,
            MediaKind::Animation(_) => Some("animation/GIF"),
            MediaKind::Audio(_) => Some("audio"),
            MediaKind::Contact(_) => Some("contact"),
            MediaKind::Document(_) => Some("document"),
            MediaKind::Game(_) => Some("game"),
            MediaKind::Location(_) => Some("location"),
            MediaKind::Photo(_) => Some("photo"),
            MediaKind::Poll(_) => Some("poll"),
            MediaKind::Sticker(_) => Some("sticker"),
            MediaKind::Venue(_) => Some("venue"),
            MediaKind::Video(_) => Some("video"),
            MediaKind::VideoNote(_) => Some("video note"),
            MediaKind::Voice(_) => Some("voice"),
            _ => Some("unknown media"),
        },
        _ => None,
    }
}
