//! In-memory collaborators for router and dispatcher tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use {
    anyhow::{Result, anyhow},
    async_trait::async_trait,
    image::{DynamicImage, ImageFormat, Rgb, RgbImage},
    lingua_common::types::{AudioFormat, FileRef, ImageRef, UserId},
    lingua_sessions::{Exchange, MemorySessionStore, Session, SessionStore},
    std::{
        collections::{HashMap, VecDeque},
        io::Cursor,
        sync::{
            Arc, Mutex,
            atomic::{AtomicU64, Ordering},
        },
    },
};

use crate::{
    registry::ModeRegistry,
    router::{Router, RouterSettings, Services},
    service::{ChatBackend, Clock, FileFetcher, ImageBackend, Outbound, Transcriber},
};

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 200])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub(crate) struct ManualClock(AtomicU64);

impl ManualClock {
    pub(crate) fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Chat backend answering from a queue; fails once the queue is empty.
#[derive(Default)]
pub(crate) struct MockChat {
    answers: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<Exchange>>>,
}

#[async_trait]
impl ChatBackend for MockChat {
    async fn complete(&self, exchanges: &[Exchange]) -> Result<String> {
        self.calls.lock().unwrap().push(exchanges.to_vec());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("chat backend unavailable"))
    }
}

#[derive(Default)]
pub(crate) struct MockImages {
    result: Mutex<Option<Vec<ImageRef>>>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageBackend for MockImages {
    async fn generate(&self, prompt: &str) -> Result<Vec<ImageRef>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("image backend unavailable"))
    }
}

#[derive(Default)]
pub(crate) struct MockTranscriber {
    transcript: Mutex<Option<String>>,
    calls: Mutex<Vec<(Vec<u8>, AudioFormat)>>,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, format: AudioFormat) -> Result<String> {
        self.calls.lock().unwrap().push((audio, format));
        self.transcript
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("transcription unavailable"))
    }
}

#[derive(Default)]
pub(crate) struct MockFiles {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockFiles {
    pub(crate) fn insert(&self, id: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(id.to_string(), bytes);
    }
}

#[async_trait]
impl FileFetcher for MockFiles {
    async fn fetch(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(file.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("file {file} not found"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Text(UserId, String),
    Image(UserId, ImageRef),
}

#[derive(Default)]
pub(crate) struct MockOutbound {
    sent: Mutex<Vec<Sent>>,
}

impl MockOutbound {
    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Outbound for MockOutbound {
    async fn send_text(&self, user: UserId, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(user, text.to_string()));
        Ok(())
    }

    async fn send_image(&self, user: UserId, image: &ImageRef) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Image(user, image.clone()));
        Ok(())
    }
}

pub(crate) struct Harness {
    pub router: Arc<Router>,
    pub store: Arc<MemorySessionStore>,
    pub clock: Arc<ManualClock>,
    pub chat: Arc<MockChat>,
    pub images: Arc<MockImages>,
    pub transcriber: Arc<MockTranscriber>,
    pub files: Arc<MockFiles>,
    pub outbound: Arc<MockOutbound>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_settings(RouterSettings::default())
    }

    pub(crate) fn with_settings(settings: RouterSettings) -> Self {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock(AtomicU64::new(1_700_000_000)));
        let chat = Arc::new(MockChat::default());
        let images = Arc::new(MockImages::default());
        let transcriber = Arc::new(MockTranscriber::default());
        let files = Arc::new(MockFiles::default());
        let outbound = Arc::new(MockOutbound::default());

        let services = Services {
            chat: chat.clone(),
            images: images.clone(),
            transcriber: transcriber.clone(),
            files: files.clone(),
            outbound: outbound.clone(),
        };
        let router = Router::new(Arc::new(ModeRegistry::with_defaults()), services, settings)
            .with_store(store.clone())
            .with_clock(clock.clone());

        Self {
            router: Arc::new(router),
            store,
            clock,
            chat,
            images,
            transcriber,
            files,
            outbound,
        }
    }

    pub(crate) fn chat_answers<const N: usize>(&self, answers: [&str; N]) {
        self.chat
            .answers
            .lock()
            .unwrap()
            .extend(answers.iter().map(|a| a.to_string()));
    }

    pub(crate) fn image_result(&self, images: Vec<ImageRef>) {
        *self.images.result.lock().unwrap() = Some(images);
    }

    pub(crate) fn transcript(&self, text: &str) {
        *self.transcriber.transcript.lock().unwrap() = Some(text.to_string());
    }

    pub(crate) async fn session(&self, user: i64) -> Session {
        self.store.get(UserId(user)).await.unwrap()
    }

    pub(crate) fn chat_calls(&self) -> Vec<Vec<Exchange>> {
        self.chat.calls.lock().unwrap().clone()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.images.prompts.lock().unwrap().clone()
    }

    pub(crate) fn transcriptions(&self) -> Vec<(Vec<u8>, AudioFormat)> {
        self.transcriber.calls.lock().unwrap().clone()
    }

    /// Texts sent to any user, in order.
    pub(crate) fn texts(&self) -> Vec<String> {
        self.outbound
            .sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text(_, text) => Some(text),
                Sent::Image(..) => None,
            })
            .collect()
    }

    pub(crate) fn texts_for(&self, user: i64) -> Vec<String> {
        self.outbound
            .sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text(to, text) if to == UserId(user) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn images_sent(&self) -> Vec<ImageRef> {
        self.outbound
            .sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Image(_, image) => Some(image),
                Sent::Text(..) => None,
            })
            .collect()
    }
}
