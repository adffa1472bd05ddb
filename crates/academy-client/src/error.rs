use academy_core::CoreError;
use thiserror::Error;

/// Failure of a request issued through [`crate::ApiClient`].
///
/// `Clone` so that one settled outcome can be handed to every caller that
/// shared a deduplicated read.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("rate limited: gave up after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request url '{0}'")]
    InvalidUrl(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("not signed in: run `academy login`")]
    NotSignedIn,

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("request task failed: {0}")]
    Task(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Shape { .. } | CoreError::Json(_) => ApiError::Decode(e.to_string()),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
