//! Telegram transport for lingua.
//!
//! Long-polls the Bot API with teloxide, converts messages into router
//! events, and delivers text and image replies.

pub mod bot;
pub mod chunk;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_api;

pub use {
    bot::{build_bot, connect, poll, start_polling},
    config::TelegramConfig,
    error::{Error, Result},
    handlers::InboundSink,
    outbound::TelegramOutbound,
};
