use academy_client::ApiClient;
use academy_core::{paths, ClientConfig, SessionStorage};
use anyhow::Context;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything a command needs: the shared client, the output mode, and a
/// runtime to drive async calls from the synchronous command handlers.
pub struct Ctx {
    pub client: ApiClient,
    pub json: bool,
    session_hint: Arc<AtomicBool>,
    rt: tokio::runtime::Runtime,
}

impl Ctx {
    /// Resolve the state directory, load config, and build the client.
    ///
    /// `api_url` (from `--api-url` / `ACADEMY_API_URL`) wins over
    /// `config.yaml`.
    pub fn open(home: Option<&Path>, api_url: Option<String>, json: bool) -> anyhow::Result<Self> {
        let state_dir = paths::state_dir(home).context("cannot locate state directory")?;
        let mut config = ClientConfig::load(&state_dir)
            .with_context(|| format!("failed to load config from {}", state_dir.display()))?;
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        tracing::debug!(state_dir = %state_dir.display(), base_url = %config.base_url, "client configured");

        let client = ApiClient::new(&config, SessionStorage::new(&state_dir));
        let session_hint = Arc::new(AtomicBool::new(true));
        let hint = Arc::clone(&session_hint);
        client.reset_on_unauthorized(move || {
            if hint.load(Ordering::Relaxed) {
                eprintln!("session expired: run `academy login` to sign in again");
            }
        });

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;

        Ok(Ctx {
            client,
            json,
            session_hint,
            rt,
        })
    }

    /// Commands that run without a session (login, register, password
    /// reset) report a 401 as their own failure, not as an expired session.
    pub fn quiet_session_hint(&self) {
        self.session_hint.store(false, Ordering::Relaxed);
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.rt.block_on(fut)
    }

    /// Fail early with a clear message instead of letting the server
    /// answer 401.
    pub fn require_session(&self) -> anyhow::Result<()> {
        if self.client.is_signed_in() {
            Ok(())
        } else {
            Err(academy_client::ApiError::NotSignedIn.into())
        }
    }
}
