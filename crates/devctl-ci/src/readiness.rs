//! Readiness polling: fixed-interval retry inside an overall deadline.

use std::future::Future;
use std::time::Duration;

use devctl_core::{DevError, EnvironmentSettings, Result};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Polling cadence for a readiness probe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two probes (milliseconds).
    pub interval_ms: u64,
    /// Overall deadline measured from the first probe (milliseconds).
    pub timeout_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 300,
            timeout_ms: 5_000,
        }
    }
}

impl From<&EnvironmentSettings> for PollPolicy {
    fn from(settings: &EnvironmentSettings) -> Self {
        Self {
            interval_ms: settings.poll_interval_ms,
            timeout_ms: settings.startup_timeout_ms,
        }
    }
}

/// Successful poll summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Number of probes made, including the successful one.
    pub attempts: u32,
    pub elapsed_ms: u64,
}

/// Probe until `probe` succeeds or the deadline passes.
///
/// The first probe always runs. Each probe is cut off at the deadline, and a
/// failed probe is only retried when the next attempt would start before the
/// deadline; otherwise the poller waits out the remaining time and returns
/// [`DevError::StartupTimeout`] carrying the last failure observed.
pub async fn poll_until_ready<F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<ReadinessReport>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<(), String>>,
{
    let start = Instant::now();
    let deadline = start + Duration::from_millis(policy.timeout_ms);
    let interval = Duration::from_millis(policy.interval_ms);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let answer = match tokio::time::timeout(remaining, probe()).await {
            Ok(answer) => answer,
            Err(_elapsed) => Err(format!(
                "readiness probe did not answer within {}ms",
                remaining.as_millis()
            )),
        };

        match answer {
            Ok(()) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!(attempts, elapsed_ms, "Readiness probe succeeded");
                return Ok(ReadinessReport {
                    attempts,
                    elapsed_ms,
                });
            }
            Err(reason) => {
                debug!(attempt = attempts, error = %reason, "Readiness probe failed");
                if Instant::now() + interval >= deadline {
                    tokio::time::sleep_until(deadline).await;
                    return Err(DevError::StartupTimeout {
                        attempts,
                        elapsed_ms: start.elapsed().as_millis() as u64,
                        last_error: reason,
                    });
                }
                tokio::time::sleep(interval).await;
            }
        }
    }
}
