//! Caller-side retry for bound-cluster operations.
//!
//! Sleepy battery devices miss frames routinely, so drivers wrap their device
//! calls in [`with_retry`].  Only [`ClusterError::is_recoverable`] failures
//! are retried; a misused API fails on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::application::bound_cluster::ClusterError;
use crate::infrastructure::config::RetryConfig;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.  Zero behaves like one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Try once, never retry.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.attempts, Duration::from_millis(config.delay_ms))
    }
}

/// Runs `op` until it succeeds, fails unrecoverably, or runs out of attempts.
///
/// Returns the last error when every attempt failed.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ClusterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClusterError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_recoverable() && attempt < attempts => {
                warn!(attempt, attempts, error = %e, "operation failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
