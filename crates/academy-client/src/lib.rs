//! `academy-client`: request orchestration for the academy REST API.
//!
//! Every dashboard screen talks to the backend through one [`ApiClient`].
//! It owns the cross-cutting behavior so individual calls stay one-liners:
//! credential injection, retry with backoff, read deduplication, the
//! session-expired signal, and the cached user profile.
//!
//! # Architecture
//!
//! ```text
//! ApiClient::request(endpoint, RequestOptions)
//!     │
//!     ├── GET ──► InFlight        ← one pending read per (endpoint, body);
//!     │               │              later callers share its outcome
//!     ▼               ▼
//! Inner::dispatch  ← join base URL (no double /api), attach Bearer header
//!     │
//!     ▼
//! send_with_retry  ← 429 and network failures only; exponential backoff
//!     │              + jitter, 429 waits longer; cancellable
//!     ▼
//! Transport        ← ReqwestTransport in production, scripted fake in tests
//!     │
//!     ▼
//! interpret        ← 2xx → JSON, 401 → UnauthorizedSignal::emit, else Status
//! ```
//!
//! Typed endpoints live on top: [`auth`] for the session lifecycle,
//! [`profile`] for the read-through profile cache, and [`resources`] for
//! the student and admin collections.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use academy_client::ApiClient;
//! use academy_core::{ClientConfig, SessionStorage};
//!
//! let client = ApiClient::new(&ClientConfig::load(&state_dir)?, SessionStorage::new(&state_dir));
//! client.reset_on_unauthorized(|| eprintln!("session expired, sign in again"));
//!
//! let profile = client.profile().await?;
//! let modules = client.curriculum().await?;
//! ```

pub mod auth;
pub mod cancel;
pub mod client;
pub mod dedup;
pub mod error;
pub mod profile;
pub mod resources;
pub mod retry;
pub mod signal;
pub mod transport;
pub mod url;

#[cfg(test)]
mod testing;

pub use cancel::CancelToken;
pub use client::{ApiClient, RequestOptions};
pub use error::ApiError;
pub use retry::{RetryCause, RetryPolicy};
pub use signal::{SubscriptionId, UnauthorizedSignal};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ApiError>;
