use {
    async_trait::async_trait,
    dashmap::{DashMap, mapref::entry::Entry},
    lingua_common::types::UserId,
    tracing::{debug, trace},
};

use crate::{Result, session::Session};

/// Storage for per-user sessions.
///
/// `get` never fails for an unknown user: it hands back a fresh `Unset`
/// session. Callers serialize `get`/`put` pairs through [`crate::UserLocks`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user: UserId) -> Result<Session>;
    async fn put(&self, user: UserId, session: Session) -> Result<()>;
}

/// Process-lifetime in-memory store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<UserId, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users seen so far.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user: UserId) -> Result<Session> {
        let session = match self.sessions.entry(user) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                debug!(user_id = %user, "new session");
                entry.insert(Session::default()).value().clone()
            },
        };
        Ok(session)
    }

    async fn put(&self, user: UserId, session: Session) -> Result<()> {
        trace!(
            user_id = %user,
            mode = session.mode.name(),
            history_len = session.history.len(),
            "session stored"
        );
        self.sessions.insert(user, session);
        Ok(())
    }
}
