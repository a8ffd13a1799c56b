//! Retry policy: bounds and delay arithmetic for rate-limited attempts.
//!
//! Pure computation only. Sleeping and randomness are supplied by the caller,
//! see `application::services::RetryingRequestExecutor`.

use std::time::Duration;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::outcome::RateLimit;

/// Upper bound (exclusive) of the random jitter added to every delay.
pub const MAX_JITTER: Duration = Duration::from_millis(500);

/// Minimum delay enforced for known slow upstreams.
pub const SLOW_UPSTREAM_FLOOR: Duration = Duration::from_millis(300);

/// Upstreams that get the minimum delay floor, matched case-insensitively.
pub const DEFAULT_SLOW_UPSTREAMS: &[&str] = &["igdb"];

// 2^16 * base is already far beyond any sane wait
const MAX_EXPONENT: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub exponential_backoff: bool,
    /// Lower-cased identifiers of slow upstreams
    pub slow_upstreams: Vec<String>,
    pub slow_upstream_floor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryPolicy {
    /// 3 retries, 1 s base delay, exponential backoff.
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            exponential_backoff: true,
            slow_upstreams: DEFAULT_SLOW_UPSTREAMS.iter().map(|s| s.to_string()).collect(),
            slow_upstream_floor: SLOW_UPSTREAM_FLOOR,
        }
    }

    /// Faster failure turnaround for bulk callers: 2 retries, 0.5 s base delay.
    pub fn batch() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            ..Self::standard()
        }
    }

    /// Build a policy from configuration values expressed in seconds.
    pub fn from_secs(
        max_retries: u32,
        base_delay_secs: f64,
        exponential_backoff: bool,
    ) -> DomainResult<Self> {
        let base_delay = secs_to_duration("base delay", base_delay_secs)?;
        Ok(Self {
            max_retries,
            base_delay,
            exponential_backoff,
            ..Self::standard()
        })
    }

    pub fn with_slow_upstreams<I, S>(mut self, upstreams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.slow_upstreams = upstreams
            .into_iter()
            .map(|s| s.as_ref().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn with_slow_upstream_floor_secs(mut self, secs: f64) -> DomainResult<Self> {
        self.slow_upstream_floor = secs_to_duration("slow upstream floor", secs)?;
        Ok(self)
    }

    /// Maximum number of times the operation may be invoked.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another attempt is allowed after `attempt` (0-based) failed.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    pub fn is_slow_upstream(&self, source_name: &str) -> bool {
        let source = source_name.to_lowercase();
        self.slow_upstreams
            .iter()
            .any(|id| source.contains(id.as_str()))
    }

    /// Delay before the next attempt after attempt number `attempt` (0-based)
    /// was rate limited. `jitter` is expected in `[0, MAX_JITTER)`.
    pub fn delay_for(&self, attempt: u32, limit: &RateLimit, jitter: Duration) -> Duration {
        let wait = if self.exponential_backoff && attempt > 0 {
            self.exponential_delay(attempt)
        } else {
            limit.retry_after().unwrap_or(self.base_delay)
        };
        let delay = wait.saturating_add(jitter);

        match &limit.source_name {
            Some(source) if self.is_slow_upstream(source) => delay.max(self.slow_upstream_floor),
            _ => delay,
        }
    }

    fn exponential_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.pow(attempt.min(MAX_EXPONENT));
        self.base_delay.saturating_mul(factor)
    }
}

fn secs_to_duration(what: &str, secs: f64) -> DomainResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| DomainError::InvalidPolicy {
        message: format!("{what} must be a finite, non-negative number of seconds, got {secs}"),
    })
}
