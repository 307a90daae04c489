//! Per-user ordered delivery of inbound events to the router.

use {
    dashmap::DashMap,
    lingua_common::types::UserId,
    std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    },
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    route::{InboundEvent, Payload},
    router::Router,
};

/// How long a user's worker waits for another event before exiting.
pub const DEFAULT_WORKER_IDLE: Duration = Duration::from_secs(600);

struct UserQueue {
    generation: u64,
    tx: mpsc::UnboundedSender<Payload>,
}

/// Fans inbound events out to one worker per user.
///
/// Each user's events are handled strictly in arrival order by that user's
/// worker; workers for different users run concurrently. Submitting never
/// blocks the caller, so a slow backend call only delays the same user.
/// A worker that stays idle exits and the next event starts a new one.
pub struct Dispatcher {
    router: Arc<Router>,
    queues: Arc<DashMap<UserId, UserQueue>>,
    generation: AtomicU64,
    idle_timeout: Duration,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, cancel: CancellationToken) -> Self {
        Self {
            router,
            queues: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            idle_timeout: DEFAULT_WORKER_IDLE,
            cancel,
        }
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Queue an event behind the user's earlier events.
    pub fn submit(&self, event: InboundEvent) {
        let InboundEvent { user_id, payload } = event;
        if self.cancel.is_cancelled() {
            debug!(user_id = %user_id, "dispatcher stopped, dropping event");
            return;
        }

        // Sending while the entry is held keeps it atomic with a worker's
        // idle exit, which removes the entry under the same shard lock.
        let mut queue = self
            .queues
            .entry(user_id)
            .or_insert_with(|| self.spawn_worker(user_id));
        if let Err(mpsc::error::SendError(payload)) = queue.tx.send(payload) {
            *queue = self.spawn_worker(user_id);
            if queue.tx.send(payload).is_err() {
                warn!(user_id = %user_id, "failed to queue event");
            }
        }
    }

    /// Number of users with a live worker queue.
    pub fn active_users(&self) -> usize {
        self.queues.len()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn spawn_worker(&self, user_id: UserId) -> UserQueue {
        let (tx, mut rx) = mpsc::unbounded_channel::<Payload>();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let router = Arc::clone(&self.router);
        let queues = Arc::clone(&self.queues);
        let cancel = self.cancel.clone();
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            loop {
                let payload = tokio::select! {
                    () = cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(payload) => payload,
                        None => break,
                    },
                    () = tokio::time::sleep(idle_timeout) => {
                        let retired = queues
                            .remove_if(&user_id, |_, queue| {
                                queue.generation == generation && rx.is_empty()
                            })
                            .is_some();
                        if retired {
                            debug!(user_id = %user_id, "user worker idle");
                            break;
                        }
                        continue;
                    },
                };
                // The router has already logged and notified the user.
                if let Err(e) = router.handle(InboundEvent { user_id, payload }).await {
                    debug!(user_id = %user_id, error_kind = e.kind(), "event failed");
                }
            }
            debug!(user_id = %user_id, "user worker stopped");
        });

        UserQueue { generation, tx }
    }
}
