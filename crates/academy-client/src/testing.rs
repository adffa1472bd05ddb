//! Scripted in-process transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use academy_core::{ClientConfig, SessionStorage};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tempfile::TempDir;

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::ApiClient;

pub const TEST_BASE_URL: &str = "https://academy.test/api";

#[derive(Debug, Clone)]
pub enum Reply {
    Response(HttpResponse),
    Fail(String),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Response(HttpResponse::new(200, body.to_string()))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Response(HttpResponse::new(status, body))
    }

    pub fn fail(message: &str) -> Self {
        Reply::Fail(message.to_string())
    }
}

/// Replies are scripted per URL path. Each call consumes the front of the
/// queue; the last reply repeats forever. Unscripted paths answer 404.
#[derive(Default)]
pub struct FakeTransport {
    latency: Mutex<Duration>,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_latency(self: Arc<Self>, latency: Duration) -> Arc<Self> {
        *self.latency.lock().unwrap() = latency;
        self
    }

    /// Replace whatever was scripted for `path`.
    pub fn script(&self, path: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into());
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next_reply(&self, path: &str) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::status(404, "unscripted"),
        }
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        let path = request.url.path().to_string();
        *self.calls.lock().unwrap().entry(path.clone()).or_default() += 1;
        self.requests.lock().unwrap().push(request);
        let reply = self.next_reply(&path);
        let latency = *self.latency.lock().unwrap();

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match reply {
                Reply::Response(resp) => Ok(resp),
                Reply::Fail(message) => Err(TransportError(message)),
            }
        }
        .boxed()
    }
}

pub fn client_in(fake: &Arc<FakeTransport>, state_dir: &Path) -> ApiClient {
    let config = ClientConfig::default().with_base_url(TEST_BASE_URL);
    ApiClient::with_transport(&config, SessionStorage::new(state_dir), Arc::clone(fake))
}

pub fn client(fake: &Arc<FakeTransport>) -> (ApiClient, TempDir) {
    let dir = TempDir::new().unwrap();
    let client = client_in(fake, dir.path());
    (client, dir)
}
