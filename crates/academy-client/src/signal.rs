use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`UnauthorizedSignal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observers notified whenever the server rejects our credential.
///
/// The dispatcher calls [`emit`](Self::emit) once per 401 response and does
/// not wait on or inspect what listeners do. Callbacks run synchronously on
/// the emitting task, so they must not block.
#[derive(Default)]
pub struct UnauthorizedSignal {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Callback)>>,
}

impl UnauthorizedSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((id, Arc::new(callback)));
        }
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn emit(&self) {
        // Snapshot first so a callback may subscribe or unsubscribe.
        let snapshot: Vec<Callback> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(_) => return,
        };
        tracing::debug!(listeners = snapshot.len(), "emitting unauthorized signal");
        for cb in snapshot {
            cb();
        }
    }
}

impl std::fmt::Debug for UnauthorizedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedSignal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
