//! Caller-side retry of whole top-level runs.
//!
//! Agents never retry internally. A caller that wants another attempt
//! re-issues the run on the same ledger, so failed attempts stay accounted.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use tandem_protocols::agent::Agent;
use tandem_protocols::usage::UsageLedger;

use crate::runner::{RunReport, RunRequest, Runner};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one.
    pub max_retries: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Configuration allowing `max_attempts` attempts in total.
    pub fn with_attempts(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries: max_attempts.saturating_sub(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
            ..Default::default()
        }
    }

    /// Calculate delay for a given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);

        let delay_ms = if self.jitter {
            let jitter = rand_jitter(delay * 0.1);
            (delay + jitter).max(0.0) as u64
        } else {
            delay as u64
        };

        Duration::from_millis(delay_ms)
    }
}

/// Simple jitter using system time.
fn rand_jitter(max: f64) -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as f64 / u32::MAX as f64) * max * 2.0 - max
}

/// Run an agent, re-issuing the run while it fails with a retryable error.
///
/// Every attempt charges the same ledger; the returned report's usage
/// covers all attempts.
pub async fn retry_run<A: Agent>(
    runner: &Runner,
    agent: &A,
    request: RunRequest,
    config: &RetryConfig,
) -> RunReport<A::Output> {
    let ledger = request
        .ledger
        .clone()
        .unwrap_or_else(|| Arc::new(UsageLedger::new()));
    let request = request.with_ledger(ledger);

    let attempts = retry_with(config, agent.id(), move || {
        let request = request.clone();
        async move { Ok::<_, Infallible>(runner.run(agent, request).await) }
    });
    match attempts.await {
        Ok(report) => report,
        Err(never) => match never {},
    }
}

/// Drive `attempt` under the retry policy.
///
/// Each call to `attempt` produces one top-level run. Another attempt is
/// made while the run fails with a retryable error. An `Err` from `attempt`
/// itself stops retrying and is returned as is.
pub async fn retry_with<T, E, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut attempt: F,
) -> Result<RunReport<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunReport<T>, E>>,
{
    let mut retries = 0;
    loop {
        let report = attempt().await?;
        let retryable = matches!(&report.outcome, Err(e) if e.is_retryable());
        if !retryable || retries >= config.max_retries {
            return Ok(report);
        }

        let delay = config.delay_for_attempt(retries);
        if let Err(e) = &report.outcome {
            warn!(
                "Run of '{}' failed (attempt {}/{}): {}, retrying in {:?}",
                label,
                retries + 1,
                config.max_retries + 1,
                e,
                delay
            );
        }
        retries += 1;
        sleep(delay).await;
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
