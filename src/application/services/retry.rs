//! Rate-limit aware request execution
//!
//! Wraps a single asynchronous API call and retries it while the upstream
//! keeps answering with a rate-limit signal, waiting a little longer each time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{Outcome, RetryPolicy, MAX_JITTER};
use crate::infrastructure::traits::{JitterSource, RandomJitter, Sleeper, TokioSleeper};

/// Result of a retried call together with what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryRun<T> {
    /// Outcome of the last attempt
    pub outcome: Outcome<T>,
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// Total time spent sleeping between attempts
    pub waited: Duration,
}

/// Executes an operation with bounded, backoff-based retry on rate limits.
///
/// Holds no per-call state, so one executor can serve any number of
/// concurrent calls.
#[derive(Clone)]
pub struct RetryingRequestExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn JitterSource>,
}

impl RetryingRequestExecutor {
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>, jitter: Arc<dyn JitterSource>) -> Self {
        Self {
            policy,
            sleeper,
            jitter,
        }
    }

    /// Executor with the given policy, the tokio timer and entropy-seeded jitter.
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self::new(
            policy,
            Arc::new(TokioSleeper),
            Arc::new(RandomJitter::from_entropy()),
        )
    }

    pub fn standard() -> Self {
        Self::with_policy(RetryPolicy::standard())
    }

    /// Reduced limits for bulk callers.
    pub fn batch() -> Self {
        Self::with_policy(RetryPolicy::batch())
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails without a rate-limit signal,
    /// or the retry budget is spent. Returns the last outcome verbatim.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        self.run(operation).await.outcome
    }

    /// Like [`execute`](Self::execute), also reporting attempts and time waited.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> RetryRun<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let mut attempt: u32 = 0;
        let mut waited = Duration::ZERO;

        loop {
            debug!(attempt = attempt + 1, max = self.policy.max_attempts(), "invoking operation");
            let outcome = operation().await;

            let limit = match outcome.rate_limit() {
                Some(limit) if self.policy.can_retry(attempt) => limit.clone(),
                _ => {
                    match &outcome {
                        Outcome::Success(_) => {}
                        Outcome::OtherFailure(message) => {
                            debug!(%message, "terminal failure, not retrying")
                        }
                        Outcome::RateLimited(limit) => debug!(
                            source = limit.source(),
                            attempts = attempt + 1,
                            "rate limited, retries exhausted"
                        ),
                    }
                    return RetryRun {
                        outcome,
                        attempts: attempt + 1,
                        waited,
                    };
                }
            };

            let jitter = self.jitter.draw(MAX_JITTER);
            let delay = self.policy.delay_for(attempt, &limit, jitter);
            warn!(
                source = limit.source(),
                "{} rate limit exceeded, retrying after {:.2}s (attempt {}/{})",
                limit.source(),
                delay.as_secs_f64(),
                attempt + 1,
                self.policy.max_retries
            );

            self.sleeper.sleep(delay).await;
            waited = waited.saturating_add(delay);
            attempt += 1;
        }
    }
}

impl std::fmt::Debug for RetryingRequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingRequestExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
