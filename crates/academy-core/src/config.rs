use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "ACADEMY_API_URL";

// ---------------------------------------------------------------------------
// RetrySettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
    /// Extra factor applied to the backoff when the server answered 429.
    #[serde(default = "default_rate_limit_multiplier")]
    pub rate_limit_multiplier: u32,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    300
}

fn default_rate_limit_multiplier() -> u32 {
    2
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            rate_limit_multiplier: default_rate_limit_multiplier(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root. May be relative (`/api`), in which case it is resolved
    /// against `origin`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default = "default_profile_ttl_secs")]
    pub profile_ttl_secs: u64,
}

fn default_base_url() -> String {
    "/api".to_string()
}

fn default_origin() -> String {
    "http://localhost:8000".to_string()
}

fn default_profile_ttl_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            origin: default_origin(),
            retry: RetrySettings::default(),
            profile_ttl_secs: default_profile_ttl_secs(),
        }
    }
}

impl ClientConfig {
    /// Load `<state_dir>/config.yaml` if it exists, then apply `ACADEMY_API_URL`.
    pub fn load(state_dir: &Path) -> Result<Self> {
        Self::load_with_env(state_dir, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with the environment read through `lookup`.
    pub fn load_with_env(
        state_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = paths::config_path(state_dir);
        let cfg = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            ClientConfig::default()
        };
        Ok(cfg.apply_env(lookup))
    }

    /// Apply environment overrides through `lookup` so callers can inject
    /// a fake environment.
    pub fn apply_env(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(url) => self.with_base_url(url),
            None => self,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }
}
