use std::time::Duration;

use academy_core::RetrySettings;
use rand::Rng;

/// Why an attempt is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCause {
    /// The server answered 429.
    RateLimited,
    /// No well-formed response at all.
    Transport,
}

impl std::fmt::Display for RetryCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryCause::RateLimited => write!(f, "rate limited"),
            RetryCause::Transport => write!(f, "network error"),
        }
    }
}

/// Exponential backoff with jitter, bounded by `max_retries`.
///
/// Retry `n` (0-based) waits `base_delay * 2^n`, multiplied by
/// `rate_limit_multiplier` when the server asked us to slow down, plus a
/// uniform jitter in `[0, max_jitter]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
    pub rate_limit_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_retries: s.max_retries,
            base_delay: Duration::from_millis(s.base_delay_ms),
            max_jitter: Duration::from_millis(s.max_jitter_ms),
            rate_limit_multiplier: s.rate_limit_multiplier.max(1),
        }
    }
}

impl RetryPolicy {
    /// Upper bound on sends for one request, first attempt included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic part of the delay before retry `retry`.
    pub fn backoff(&self, retry: u32, cause: RetryCause) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        let factor = match cause {
            RetryCause::RateLimited => factor.saturating_mul(self.rate_limit_multiplier),
            RetryCause::Transport => factor,
        };
        self.base_delay.saturating_mul(factor)
    }

    /// Full delay before retry `retry`, jitter included.
    pub fn delay_for(&self, retry: u32, cause: RetryCause) -> Duration {
        self.backoff(retry, cause) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}
