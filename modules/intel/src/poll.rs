//! Attempt-bounded polling for submitted analysis jobs.

use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use vigil_core::{CancelToken, ScanError};

/// Polling budget for one job: a fixed per-attempt interval, a hard attempt
/// ceiling, and an optional wall-clock deadline on top of the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct PollPlan {
    pub max_attempts: u32,
    pub interval: Duration,
    pub deadline: Option<Duration>,
}

/// File uploads go through the slower sandbox pipeline, so they get the
/// larger budget.
pub const FILE_ANALYSIS: PollPlan = PollPlan {
    max_attempts: 30,
    interval: Duration::from_millis(2000),
    deadline: None,
};

/// URL analyses usually settle within a few attempts.
pub const URL_ANALYSIS: PollPlan = PollPlan {
    max_attempts: 10,
    interval: Duration::from_millis(2000),
    deadline: None,
};

/// What one fetch observed.
pub enum PollStep<T> {
    Pending,
    Completed(T),
}

/// Drive a job to its terminal state.
///
/// Each attempt waits `interval`, then fetches once. Fetch failures are
/// treated as transient: logged and charged against the attempt budget, never
/// surfaced mid-poll. Exhausting the attempts or the deadline yields
/// [`ScanError::Timeout`]; cancellation is observed during the wait.
pub async fn poll_until_complete<T, F, Fut>(
    plan: &PollPlan,
    cancel: &CancelToken,
    mut fetch: F,
) -> Result<T, ScanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStep<T>, ScanError>>,
{
    let started = Instant::now();
    for attempt in 1..=plan.max_attempts {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(ScanError::Cancelled),
            _ = tokio::time::sleep(plan.interval) => {}
        }
        if let Some(deadline) = plan.deadline {
            if started.elapsed() >= deadline {
                return Err(ScanError::Timeout);
            }
        }
        match fetch().await {
            Ok(PollStep::Completed(payload)) => return Ok(payload),
            Ok(PollStep::Pending) => {}
            Err(e) => debug!("poll attempt {attempt}/{} failed: {e}", plan.max_attempts),
        }
    }
    Err(ScanError::Timeout)
}
