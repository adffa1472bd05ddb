use reqwest::Url;

use crate::{ApiError, Result};

const API_SEGMENT: &str = "/api";

/// Join the API root and an endpoint path with exactly one `/` between them.
///
/// Callers sometimes pass endpoints that already carry the `/api` prefix
/// (`/api/users/me`) while the root also ends in `/api`; the duplicate
/// segment is dropped so the request does not go to `/api/api/...`.
pub fn join_url(base: &str, endpoint: &str) -> String {
    let base = base.trim_end_matches('/');
    let mut endpoint = endpoint.trim_start_matches('/');

    if base.ends_with(API_SEGMENT) {
        let prefix = &API_SEGMENT[1..];
        if endpoint == prefix {
            endpoint = "";
        } else if let Some(rest) = endpoint.strip_prefix("api/") {
            endpoint = rest;
        }
    }

    if endpoint.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{endpoint}")
    }
}

/// Resolve `url` against `origin` when it is relative and check it parses.
pub fn resolve(origin: &str, url: &str) -> Result<Url> {
    if url.contains("://") {
        return Url::parse(url).map_err(|_| ApiError::InvalidUrl(url.to_string()));
    }
    let joined = format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        url.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|_| ApiError::InvalidUrl(joined))
}
