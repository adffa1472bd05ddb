use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;

use crate::{ApiError, Result};

/// A pending read whose outcome every joined caller receives.
pub type SharedResponse = Shared<BoxFuture<'static, Result<Value>>>;

/// Table of reads currently on the wire, keyed by endpoint and body.
///
/// Lookup and insertion happen under one lock with no suspension in
/// between, so two callers can never both start the same read. The fetch
/// runs on its own task and removes its entry before publishing the
/// result; the entry is gone once the read settles even if every caller
/// has stopped waiting.
#[derive(Default)]
pub struct InFlight {
    table: Mutex<HashMap<String, SharedResponse>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(endpoint: &str, body: Option<&Value>) -> String {
        match body {
            Some(b) => format!("{endpoint}\u{0}{b}"),
            None => endpoint.to_string(),
        }
    }

    /// Join the read pending under `key`, or start one with `start`.
    ///
    /// Returns the shared outcome and whether this call started the fetch.
    pub fn join_or_start<F, Fut>(self: &Arc<Self>, key: String, start: F) -> (SharedResponse, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let mut table = self.lock();
        if let Some(pending) = table.get(&key) {
            return (pending.clone(), false);
        }

        let fetch = start();
        let owner = Arc::clone(self);
        let entry = key.clone();
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            owner.lock().remove(&entry);
            result
        });

        let shared = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Task(e.to_string())))
        }
        .boxed()
        .shared();
        table.insert(key, shared.clone());
        (shared, true)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SharedResponse>> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight").field("pending", &self.len()).finish()
    }
}
