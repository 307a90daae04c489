//! Speech-to-Text for voice notes and audio files.
//!
//! Provider-agnostic [`SttProvider`] abstraction with an OpenAI Whisper
//! implementation, and [`SttTranscriber`] to plug a provider into the router.

pub mod config;
pub mod stt;
pub mod transcriber;

pub use {
    config::{SttConfig, VoiceConfig},
    stt::{SttProvider, TranscribeRequest, Transcript, WhisperStt, build_provider},
    transcriber::SttTranscriber,
};
