//! Mode registry and message router.
//!
//! For every inbound event the router loads the user's session, decides a
//! [`Route`] (command, welcome, image generation, transcription, translation
//! or chat turn), calls the matching backend and commits the new session
//! state. The [`Dispatcher`] keeps each user's events in order.

pub mod dispatch;
pub mod error;
pub mod registry;
pub mod route;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    dispatch::Dispatcher,
    error::{Error, Result},
    registry::{ModeDescriptor, ModeRegistry, default_modes},
    route::{ChatInput, InboundEvent, Payload, Route, START_COMMAND, route},
    router::{Messages, Outcome, Router, RouterSettings, Services},
    service::{ChatBackend, Clock, FileFetcher, ImageBackend, Outbound, SystemClock, Transcriber},
};
