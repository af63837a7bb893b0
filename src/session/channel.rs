//! Session change broadcasting and subscription handles.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use super::SessionChange;

type Subscribers = HashMap<u64, mpsc::UnboundedSender<SessionChange>>;

struct ChannelInner {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl ChannelInner {
    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        // The map stays consistent even if a holder panicked mid-insert.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fan-out of [`SessionChange`] notifications to live subscribers.
///
/// Cloning yields another handle to the same set of subscribers.
#[derive(Clone)]
pub struct SessionChannel {
    inner: Arc<ChannelInner>,
}

impl SessionChannel {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a new subscriber.
    ///
    /// The returned handle removes itself from the channel when released.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers().insert(id, tx);
        trace!(subscriber = id, "session subscriber registered");

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(rx, move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers().remove(&id);
                trace!(subscriber = id, "session subscriber released");
            }
        })
    }

    /// Deliver a change to every live subscriber.
    ///
    /// Each subscriber sees changes in emission order. Subscribers whose
    /// receiver is gone are pruned. Returns the number that received it.
    pub fn emit(&self, change: SessionChange) -> usize {
        let mut subscribers = self.inner.subscribers();
        subscribers.retain(|_, tx| tx.send(change.clone()).is_ok());
        subscribers.len()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle to a session change subscription.
///
/// Released exactly once: explicitly through [`Subscription::unsubscribe`]
/// or implicitly when dropped.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SessionChange>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a receiver together with the action that detaches it.
    pub fn new(
        rx: mpsc::UnboundedReceiver<SessionChange>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            release: Some(Box::new(release)),
        }
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once released or when the provider side is gone.
    pub async fn next(&mut self) -> Option<SessionChange> {
        if self.release.is_none() {
            return None;
        }
        self.rx.recv().await
    }

    /// Take an already-delivered change without waiting.
    pub fn try_next(&mut self) -> Option<SessionChange> {
        if self.release.is_none() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Whether the subscription is still attached.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Detach from the provider.
    pub fn unsubscribe(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(release) = self.release.take() {
            self.rx.close();
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
