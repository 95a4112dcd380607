// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Connection retry with exponential backoff

use std::time::Duration;

use tracing::{info, warn};

use super::pool::PersistenceClient;
use crate::errors::DatabaseError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay applied as random jitter in both directions
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), never above `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base_secs = self.base_delay.as_secs_f64();
        let max_secs = self.max_delay.as_secs_f64().max(0.0);

        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1)) as f64;
        let mut delay = (base_secs * multiplier).min(max_secs);

        if self.jitter > 0.0 && delay > 0.0 {
            let jitter = (fastrand::f64() * 2.0 - 1.0) * self.jitter;
            delay = (delay * (1.0 + jitter)).clamp(0.0, max_secs);
        }

        Duration::from_secs_f64(delay)
    }
}

/// Connect, retrying failed attempts until the policy is exhausted.
pub async fn connect_with_retry(
    client: &dyn PersistenceClient,
    policy: &RetryPolicy,
) -> Result<(), DatabaseError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match client.connect().await {
            Ok(()) => {
                if attempt > 1 {
                    info!(attempt, "Database connected after retry");
                }
                return Ok(());
            }
            Err(e) if attempt >= max_attempts => {
                return Err(DatabaseError::RetriesExhausted {
                    attempts: attempt,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
