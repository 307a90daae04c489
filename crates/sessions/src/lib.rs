//! Per-user session state.
//!
//! A session records the mode a user selected, the direct-chat history and
//! the time of the last activity. Sessions live in memory for the lifetime of
//! the process behind the [`SessionStore`] trait; [`UserLocks`] serializes
//! read-modify-write cycles for the same user.

pub mod error;
pub mod locks;
pub mod message;
pub mod session;
pub mod store;

pub use {
    error::{Error, Result},
    locks::UserLocks,
    message::{Exchange, ExchangeContent, Role},
    session::{Mode, Session},
    store::{MemorySessionStore, SessionStore},
};
