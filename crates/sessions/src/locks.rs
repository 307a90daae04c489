use {
    dashmap::DashMap,
    lingua_common::types::UserId,
    std::sync::Arc,
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::trace,
};

/// One async mutex per user.
///
/// Holding the guard for the whole handling of an event makes every
/// session read-modify-write atomic for that user while other users
/// proceed in parallel.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user: UserId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let lock = Arc::clone(self.locks.entry(user).or_default().value());
        match Arc::clone(&lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                trace!(user_id = %user, "waiting for earlier event");
                lock.lock_owned().await
            },
        }
    }
}
