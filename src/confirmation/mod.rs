/*
 * Transaction confirmation: bounded polling of the ledger until a
 * submitted transaction reaches a terminal state
 */

use crate::config::ConfirmationConfig;
use crate::models::{ConfirmationResult, ConfirmationStatus, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the ledger reports for a transaction it can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStatus {
    /// `None` when the transaction executed cleanly.
    pub err: Option<Value>,
}

#[async_trait]
pub trait StatusLookup: Send + Sync {
    async fn transaction_status(&self, signature: &str) -> Result<Option<LedgerStatus>>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Floor for the first backoff step, so a zero `min_delay` still spaces polls.
const MIN_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmOptions {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

impl From<&ConfirmationConfig> for ConfirmOptions {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl ConfirmOptions {
    /// Delay after the `attempt`-th poll (1-based): doubles from `min_delay`
    /// and is clamped to `max_delay`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let floor = self.min_delay.max(MIN_BACKOFF);
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = floor.saturating_mul(1u32 << exponent);
        delay.clamp(floor, self.max_delay.max(floor))
    }
}

/// Result of one poll against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    NotFound,
    Found(LedgerStatus),
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    FailedOnChain(Value),
    Retry,
    TimedOut,
}

/// Pure transition function of the confirmation state machine.
///
/// `attempt` is the 1-based number of the poll that produced `poll`.
/// A visible status is terminal whatever the attempt count; anything else
/// retries until `max_attempts` polls have been made.
#[must_use]
pub fn decide(poll: &Poll, attempt: u32, max_attempts: u32) -> Decision {
    match poll {
        Poll::Found(LedgerStatus { err: Some(err) }) => Decision::FailedOnChain(err.clone()),
        Poll::Found(LedgerStatus { err: None }) => Decision::Confirmed,
        Poll::NotFound | Poll::LookupFailed(_) if attempt >= max_attempts => Decision::TimedOut,
        Poll::NotFound | Poll::LookupFailed(_) => Decision::Retry,
    }
}

pub struct ConfirmationWatcher {
    lookup: Arc<dyn StatusLookup>,
    sleeper: Arc<dyn Sleeper>,
    options: ConfirmOptions,
}

impl ConfirmationWatcher {
    #[must_use]
    pub fn new(lookup: Arc<dyn StatusLookup>, options: ConfirmOptions) -> Self {
        Self::with_sleeper(lookup, Arc::new(TokioSleeper), options)
    }

    #[must_use]
    pub fn with_sleeper(
        lookup: Arc<dyn StatusLookup>,
        sleeper: Arc<dyn Sleeper>,
        options: ConfirmOptions,
    ) -> Self {
        Self {
            lookup,
            sleeper,
            options,
        }
    }

    pub async fn confirm(&self, signature: &str) -> ConfirmationResult {
        self.confirm_with(signature, self.options).await
    }

    pub async fn confirm_with(&self, signature: &str, options: ConfirmOptions) -> ConfirmationResult {
        let max_attempts = options.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let poll = match self.lookup.transaction_status(signature).await {
                Ok(Some(status)) => Poll::Found(status),
                Ok(None) => Poll::NotFound,
                Err(e) => Poll::LookupFailed(e.to_string()),
            };
            let last_error = match &poll {
                Poll::LookupFailed(reason) => Some(reason.clone()),
                _ => None,
            };

            let status = match decide(&poll, attempt, max_attempts) {
                Decision::Retry => {
                    if let Poll::LookupFailed(reason) = &poll {
                        warn!(signature, attempt, %reason, "Status lookup failed, retrying");
                    } else {
                        debug!(signature, attempt, "Transaction not visible yet");
                    }
                    self.sleeper.sleep(options.backoff_delay(attempt)).await;
                    continue;
                }
                Decision::Confirmed => {
                    info!(signature, attempts = attempt, "Transaction confirmed");
                    ConfirmationStatus::Confirmed
                }
                Decision::FailedOnChain(error) => {
                    warn!(signature, attempts = attempt, %error, "Transaction failed on chain");
                    ConfirmationStatus::FailedOnChain { error }
                }
                Decision::TimedOut => {
                    warn!(
                        signature,
                        attempts = attempt,
                        last_error = last_error.as_deref().unwrap_or("none"),
                        "Transaction confirmation timed out"
                    );
                    ConfirmationStatus::TimedOut { last_error }
                }
            };

            return ConfirmationResult {
                signature: signature.to_string(),
                status,
                attempts: attempt,
            };
        }
    }
}
