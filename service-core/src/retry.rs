//! Bounded retry utilities for calls to remote services.
//!
//! A [`RetryPolicy`] is plain configuration (attempt budget plus a backoff
//! function), so callers can inject it and tests can drive it with tokio's
//! paused clock.

use serde::Deserialize;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Delay function applied between attempts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// The Nth failed attempt waits `N * step`.
    Linear {
        #[serde(with = "millis", rename = "step_ms")]
        step: Duration,
        #[serde(with = "millis", rename = "max_delay_ms", default = "default_max_delay")]
        max_delay: Duration,
    },
    /// The Nth failed attempt waits `initial * multiplier^(N-1)`.
    Exponential {
        #[serde(with = "millis", rename = "initial_ms")]
        initial: Duration,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        #[serde(with = "millis", rename = "max_delay_ms", default = "default_max_delay")]
        max_delay: Duration,
        #[serde(default)]
        jitter: bool,
    },
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_multiplier() -> f64 {
    2.0
}

/// Configuration for retry behavior.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff")]
    pub backoff: Backoff,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Backoff {
    Backoff::Linear {
        step: Duration::from_secs(1),
        max_delay: default_max_delay(),
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(default_max_attempts(), Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Linear backoff with the given attempt budget and step.
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear {
                step,
                max_delay: default_max_delay(),
            },
        }
    }

    /// A single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after `failed_attempts` attempts have failed (1-based).
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let n = failed_attempts.max(1);
        match &self.backoff {
            Backoff::Linear { step, max_delay } => step.saturating_mul(n).min(*max_delay),
            Backoff::Exponential {
                initial,
                multiplier,
                max_delay,
                jitter,
            } => {
                let base = initial.as_millis() as f64 * multiplier.powi(n as i32 - 1);
                let capped = base.min(max_delay.as_millis() as f64) as u64;
                let mut delay = Duration::from_millis(capped);
                if *jitter {
                    // Up to 25% on top of the computed delay
                    let extra = (capped as f64 * 0.25 * rand::random::<f64>()) as u64;
                    delay += Duration::from_millis(extra);
                }
                delay
            }
        }
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. Attempts are strictly sequential.
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt, "Call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable() {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Call failed with non-retryable error"
                    );
                    return Err(err);
                }

                if attempt >= max_attempts {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Call failed after max attempts"
                    );
                    return Err(err);
                }

                let delay = policy.delay_after(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Call failed, retrying after delay"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
