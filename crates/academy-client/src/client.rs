use std::sync::{Arc, Weak};

use academy_core::{envelope, ClientConfig, SessionStorage};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::dedup::InFlight;
use crate::profile::ProfileCache;
use crate::retry::{RetryCause, RetryPolicy};
use crate::signal::{SubscriptionId, UnauthorizedSignal};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::{url, ApiError, Result};

// ─── RequestOptions ───────────────────────────────────────────────────────

/// Per-call options for [`ApiClient::request`].
///
/// The default is an authenticated `GET` with no body, which is the only
/// kind of request that gets deduplicated.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Do not attach the stored credential (login, register, password reset).
    pub skip_auth: bool,
    pub cancel: Option<CancelToken>,
    /// Extra component of the deduplication key. Reads with different
    /// scopes never share a fetch.
    pub dedup_scope: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn with_method(method: Method, body: Option<Value>) -> Self {
        Self {
            method,
            body,
            ..Self::default()
        }
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn cancel_with(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn dedup_scope(mut self, scope: impl Into<String>) -> Self {
        self.dedup_scope = Some(scope.into());
        self
    }
}

// ─── ApiClient ────────────────────────────────────────────────────────────

/// Client for the academy REST API.
///
/// Owns everything that outlives a single request: the in-flight read
/// table, the cached profile, and the unauthorized listeners. Cloning is
/// cheap and clones share that state; construct one per application and
/// hand clones to whoever needs it.
///
/// ```rust,ignore
/// let storage = SessionStorage::new(&state_dir);
/// let client = ApiClient::new(&ClientConfig::load(&state_dir)?, storage);
/// client.reset_on_unauthorized(|| eprintln!("session expired"));
///
/// let cohorts: Vec<Cohort> = client.get_list("/cohorts").await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    base_url: String,
    origin: String,
    transport: Box<dyn Transport>,
    retry: RetryPolicy,
    pub(crate) storage: SessionStorage,
    inflight: Arc<InFlight>,
    unauthorized: UnauthorizedSignal,
    pub(crate) profile: ProfileCache,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, storage: SessionStorage) -> Self {
        Self::with_transport(config, storage, ReqwestTransport::new())
    }

    pub fn with_transport(
        config: &ClientConfig,
        storage: SessionStorage,
        transport: impl Transport,
    ) -> Self {
        ApiClient {
            inner: Arc::new(Inner {
                base_url: config.base_url.clone(),
                origin: config.origin.clone(),
                transport: Box::new(transport),
                retry: RetryPolicy::from(&config.retry),
                storage,
                inflight: Arc::new(InFlight::new()),
                unauthorized: UnauthorizedSignal::new(),
                profile: ProfileCache::new(config.profile_ttl()),
            }),
        }
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.inner.storage
    }

    /// Number of deduplicated reads currently on the wire.
    pub fn in_flight(&self) -> usize {
        self.inner.inflight.len()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.storage.token().is_some()
    }

    // ── Unauthorized signal ───────────────────────────────────────────────

    pub fn on_unauthorized(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.unauthorized.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unauthorized.unsubscribe(id)
    }

    /// Install the long-lived session reset listener.
    ///
    /// On every 401 it clears the stored credential, user, and profile
    /// (durable and in-memory), then calls `on_reset` so the front end can
    /// send the user back to sign in.
    pub fn reset_on_unauthorized(
        &self,
        on_reset: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.unauthorized.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                if let Err(e) = inner.clear_session() {
                    tracing::warn!(error = %e, "failed to clear session after unauthorized response");
                }
            }
            on_reset();
        })
    }

    /// Drop every piece of local session state.
    pub fn clear_session(&self) -> Result<()> {
        self.inner.clear_session()
    }

    // ── Requests ──────────────────────────────────────────────────────────

    /// Issue one request against `endpoint` (relative to the API root).
    ///
    /// `GET`s are deduplicated: while a read for the same endpoint and body
    /// is pending, further callers wait on it instead of going to the
    /// network, and all of them see the same outcome.
    pub async fn request(&self, endpoint: &str, opts: RequestOptions) -> Result<Value> {
        let RequestOptions {
            method,
            body,
            skip_auth,
            cancel,
            dedup_scope,
        } = opts;

        if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ApiError::Cancelled);
        }

        if method != Method::GET {
            return self
                .inner
                .dispatch(endpoint, method, body, skip_auth, cancel.as_ref())
                .await;
        }

        let mut key = InFlight::key(endpoint, body.as_ref());
        if let Some(scope) = dedup_scope {
            key = format!("{key}\u{0}{scope}");
        }
        let inner = Arc::clone(&self.inner);
        let owned_endpoint = endpoint.to_string();
        let (pending, started) = self.inner.inflight.join_or_start(key, move || async move {
            inner
                .dispatch(&owned_endpoint, Method::GET, body, skip_auth, None)
                .await
        });
        if !started {
            tracing::debug!(endpoint, "joined in-flight read");
        }

        match cancel {
            Some(token) => tokio::select! {
                result = pending => result,
                _ = token.cancelled() => Err(ApiError::Cancelled),
            },
            None => pending.await,
        }
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value> {
        self.send_json(Method::POST, endpoint, body).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value> {
        self.send_json(Method::PUT, endpoint, body).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value> {
        self.send_json(Method::PATCH, endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value> {
        self.request(endpoint, RequestOptions::with_method(Method::DELETE, None))
            .await
    }

    /// `GET` a collection, accepting a bare array or an `items` envelope.
    pub async fn get_list<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        Ok(envelope::list(self.get(endpoint).await?)?)
    }

    /// `GET` one entity, accepting it bare or wrapped under `data` / `key`.
    pub async fn get_entity<T: DeserializeOwned>(&self, endpoint: &str, key: &str) -> Result<T> {
        Ok(envelope::entity(self.get(endpoint).await?, key)?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.request(endpoint, RequestOptions::with_method(method, Some(body)))
            .await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("in_flight", &self.inner.inflight)
            .field("unauthorized", &self.inner.unauthorized)
            .finish()
    }
}

// ─── Dispatch ─────────────────────────────────────────────────────────────

impl Inner {
    async fn dispatch(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        skip_auth: bool,
        cancel: Option<&CancelToken>,
    ) -> Result<Value> {
        let target = url::join_url(&self.base_url, endpoint);
        let url = url::resolve(&self.origin, &target)?;

        let mut headers = vec![("Content-Type", "application/json".to_string())];
        if !skip_auth {
            if let Some(token) = self.storage.token() {
                headers.push(("Authorization", format!("Bearer {token}")));
            }
        }
        let body = body.map(|b| serde_json::to_string(&b)).transpose()?;

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let response = self.send_with_retry(request, cancel).await?;
        self.interpret(response)
    }

    /// Send `request`, retrying 429s and transport failures with backoff.
    /// Any other response, success or not, is returned as-is.
    async fn send_with_retry(
        &self,
        request: HttpRequest,
        cancel: Option<&CancelToken>,
    ) -> Result<HttpResponse> {
        let mut retry = 0u32;
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(ApiError::Cancelled);
            }
            let attempt = retry + 1;
            tracing::debug!(method = %request.method, url = %request.url, attempt, "sending request");

            let (cause, failure) = match self.transport.send(request.clone()).await {
                Ok(resp) if resp.status == 429 => (
                    RetryCause::RateLimited,
                    ApiError::RateLimited { attempts: attempt },
                ),
                Ok(resp) => return Ok(resp),
                Err(e) => (RetryCause::Transport, ApiError::Transport(e.0)),
            };

            if attempt >= self.retry.max_attempts() {
                tracing::warn!(url = %request.url, attempts = attempt, %cause, "giving up");
                return Err(failure);
            }

            let delay = self.retry.delay_for(retry, cause);
            tracing::warn!(
                url = %request.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                %cause,
                "retrying request"
            );
            match cancel {
                Some(token) => tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => return Err(ApiError::Cancelled),
                },
                None => tokio::time::sleep(delay).await,
            }
            retry += 1;
        }
    }

    fn interpret(&self, response: HttpResponse) -> Result<Value> {
        match response.status {
            _ if response.is_success() => {
                if response.body.trim().is_empty() {
                    Ok(Value::Null)
                } else {
                    Ok(serde_json::from_str(&response.body)?)
                }
            }
            401 => {
                tracing::warn!("credential rejected by server");
                self.unauthorized.emit();
                Err(ApiError::Unauthorized {
                    body: response.body,
                })
            }
            status => Err(ApiError::Status {
                status,
                body: response.body,
            }),
        }
    }

    pub(crate) fn clear_session(&self) -> Result<()> {
        self.profile.clear();
        self.storage.clear()?;
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
