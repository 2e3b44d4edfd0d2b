//! Bounded retry with a fixed delay, aware of whether cached data exists.

use std::time::Duration;

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::types::InboxPayload;

use super::client::InboxTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.retry_delay(),
        }
    }
}

/// How a retry chain settled.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    Fresh { payload: InboxPayload, attempts: u32 },
    /// 404 while cached data exists: keep showing the cache, no error.
    KeptCache,
    /// Gave up, but cached data exists.
    Stale { error: SyncError, attempts: u32 },
    /// Gave up with nothing cached.
    Failed { error: SyncError, attempts: u32 },
}

pub async fn execute_with_retry(
    transport: &dyn InboxTransport,
    clock: &dyn Clock,
    policy: &RetryPolicy,
    force_refresh: bool,
    has_cache: bool,
) -> RetryOutcome {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match transport.fetch(force_refresh).await {
            Ok(payload) => {
                return RetryOutcome::Fresh {
                    payload,
                    attempts: attempt,
                }
            }
            Err(err) => err,
        };

        if err.is_not_found() && has_cache {
            log::info!("Inbox sync: endpoint returned 404, keeping cached data");
            return RetryOutcome::KeptCache;
        }

        if err.is_retryable() && attempt < attempts {
            log::warn!(
                "Inbox sync: retry {}/{} after error: {} (sleep {:?})",
                attempt,
                attempts,
                err,
                policy.delay
            );
            clock.sleep(policy.delay).await;
            continue;
        }

        log::warn!("Inbox sync: giving up after {} attempt(s): {}", attempt, err);
        return if has_cache {
            RetryOutcome::Stale {
                error: err,
                attempts: attempt,
            }
        } else {
            RetryOutcome::Failed {
                error: err,
                attempts: attempt,
            }
        };
    }
}
