//! Subscriber tracking and fan-out.
//!
//! This module provides the shared set of live event-stream listeners:
//!
//! - `SubscriberRegistry`: tracks every subscriber channel and offers frames to them
//! - `Subscription`: RAII guard for automatic cleanup on disconnect

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::protocol_constants::SUBSCRIBER_BUFFER_CAPACITY;

/// One encoded status frame, shared by every subscriber it is offered to.
pub type Frame = Arc<str>;

/// Registry-issued identity of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Result of offering one frame to every subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Subscribers whose buffer accepted the frame.
    pub delivered: usize,
    /// Subscribers skipped because their buffer was full.
    pub dropped: usize,
}

/// Manages all live event-stream subscribers.
///
/// Membership and fan-out share one mutex. The lock is only held for an
/// insert, a remove, or one pass of non-blocking offers, never across
/// network I/O. Each subscriber's sender lives only in the map, so removing
/// the entry is also what closes the channel.
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Frame>>>,
    /// Counter for generating unique subscriber IDs.
    next_id: AtomicU64,
    /// Buffer size of each subscriber channel.
    capacity: usize,
    /// Global cancellation token - when cancelled, all subscriptions end.
    /// Wrapped in RwLock so it can be replaced after close_all().
    global_cancel: RwLock<CancellationToken>,
}

impl SubscriberRegistry {
    /// Creates a registry whose subscribers buffer a single frame.
    pub fn new() -> Self {
        Self::with_capacity(SUBSCRIBER_BUFFER_CAPACITY)
    }

    /// Creates a registry with a custom per-subscriber buffer size.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
            global_cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Registers a new subscriber and returns a guard for RAII cleanup.
    ///
    /// The returned `Subscription` deregisters itself when dropped.
    pub fn register(self: &Arc<Self>) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);
        let cancel_token = self.global_cancel.read().child_token();

        let total = {
            let mut subscribers = self.subscribers.lock();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        log::info!("[SSE] Subscriber registered: {} (total: {})", id, total);

        Subscription {
            id,
            rx,
            registry: Arc::clone(self),
            cancel_token,
        }
    }

    /// Removes a subscriber and closes its channel.
    ///
    /// Idempotent: returns `false` if the subscriber was already gone.
    pub fn deregister(&self, id: SubscriberId) -> bool {
        let (removed, remaining) = {
            let mut subscribers = self.subscribers.lock();
            let removed = subscribers.remove(&id);
            (removed, subscribers.len())
        };
        match removed {
            Some(_sender) => {
                log::info!(
                    "[SSE] Subscriber unregistered: {} (remaining: {})",
                    id,
                    remaining
                );
                true
            }
            None => false,
        }
    }

    /// Offers a frame to every subscriber without waiting.
    ///
    /// A subscriber whose buffer is still full from an earlier frame misses
    /// this one. Delivery to one subscriber never depends on another.
    pub fn publish(&self, frame: Frame) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        let subscribers = self.subscribers.lock();
        for (id, tx) in subscribers.iter() {
            match tx.try_send(Arc::clone(&frame)) {
                Ok(()) => outcome.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::trace!("[SSE] Buffer full, skipping frame for {}", id);
                    outcome.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    log::trace!("[SSE] Receiver gone, skipping frame for {}", id);
                    outcome.dropped += 1;
                }
            }
        }
        outcome
    }

    /// Returns whether the subscriber is currently registered.
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().contains_key(&id)
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Signals every current subscription to end.
    ///
    /// Cancels the global token, then installs a fresh one so new
    /// subscribers can still be accepted. Entries are removed by each
    /// subscription's guard as its stream winds down.
    ///
    /// Returns the number of subscribers that were signaled.
    pub fn close_all(&self) -> usize {
        let count = self.subscriber_count();
        if count > 0 {
            log::info!("[SSE] Force-closing {} subscriber(s)", count);
        }
        let mut guard = self.global_cancel.write();
        guard.cancel();
        *guard = CancellationToken::new();
        count
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for one registered subscriber.
///
/// Owns the receiving half of the subscriber channel. Dropping it
/// deregisters the subscriber, even if the handler panics or exits early.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Frame>,
    registry: Arc<SubscriberRegistry>,
    /// Token for this subscription - cancelled on force-close.
    cancel_token: CancellationToken,
}

impl Subscription {
    /// Returns the subscriber ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns the cancellation token for this subscription.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Waits for the next frame.
    ///
    /// Returns `None` once the subscriber has been deregistered.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Takes a buffered frame without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
