//! Bounded polling of submitted jobs.
//!
//! A job moves through
//! `Submitted → Polling(attempt) → Ready | Exhausted | Failed`. Each
//! [`JobPoller::step`] issues at most one poll; [`JobPoller::wait`] drives
//! the machine to a terminal state with a fixed delay between polls.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    ComputeService, GeoprocessingError, HistogramJobResult, JobCleanup, JobHandle, PollStatus,
};

/// Default poll ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 42;

/// Default delay between polls, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// How many times to poll and how long to wait between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of polls issued before giving up. A value of zero
    /// still polls once.
    pub max_attempts: u32,
    /// Fixed delay between consecutive polls.
    pub delay_ms: u64,
}

impl RetryPolicy {
    /// The delay between polls.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    const fn ceiling(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

/// Where a job stands.
#[derive(Debug)]
pub enum JobState {
    /// Submitted, not yet polled.
    Submitted(JobHandle),
    /// Polled `attempt` times without a result.
    Polling {
        /// The job being polled.
        handle: JobHandle,
        /// Polls issued so far.
        attempt: u32,
    },
    /// The job finished.
    Ready(HistogramJobResult),
    /// The poll ceiling was reached without a result.
    Exhausted {
        /// The abandoned job.
        handle: JobHandle,
        /// Polls issued.
        attempts: u32,
    },
    /// The job or a request for it failed.
    Failed(GeoprocessingError),
}

impl JobState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Ready(_) | Self::Exhausted { .. } | Self::Failed(_)
        )
    }
}

/// Drives [`JobState`] transitions against a [`ComputeService`].
pub struct JobPoller<'a, S: ComputeService + ?Sized> {
    service: &'a S,
    policy: RetryPolicy,
}

impl<'a, S: ComputeService + ?Sized> JobPoller<'a, S> {
    /// Creates a poller for `service`.
    #[must_use]
    pub const fn new(service: &'a S, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Advances `state` by at most one poll.
    ///
    /// Terminal states are returned unchanged without contacting the
    /// service. Exhaustion is decided before polling, so a job is polled
    /// exactly `max_attempts` times before it is given up on.
    pub async fn step(&self, state: JobState) -> JobState {
        let (handle, attempt) = match state {
            JobState::Submitted(handle) => (handle, 0),
            JobState::Polling { handle, attempt } => (handle, attempt),
            terminal => return terminal,
        };

        if attempt >= self.policy.ceiling() {
            return JobState::Exhausted {
                handle,
                attempts: attempt,
            };
        }

        let attempt = attempt + 1;

        match self.service.poll(&handle.job_id).await {
            Ok(PollStatus::Ready(histogram)) => {
                log::debug!("Job {} finished after {attempt} polls", handle.job_id);
                JobState::Ready(HistogramJobResult {
                    pixel_width: handle.pixel_width,
                    histogram,
                })
            }
            Ok(PollStatus::NotReady) => {
                log::debug!(
                    "Job {} not ready (poll {attempt}/{})",
                    handle.job_id,
                    self.policy.ceiling()
                );
                JobState::Polling { handle, attempt }
            }
            Err(e) => {
                if matches!(e, GeoprocessingError::Service { .. }) {
                    self.cleanup(&handle).await;
                }
                JobState::Failed(e)
            }
        }
    }

    /// Polls the job until it finishes, fails, or hits the ceiling.
    ///
    /// # Errors
    ///
    /// Returns the job's failure, or [`GeoprocessingError::Timeout`] after
    /// `max_attempts` polls without a result. A timed-out job is deleted
    /// from the server on a best-effort basis.
    pub async fn wait(&self, handle: JobHandle) -> Result<HistogramJobResult, GeoprocessingError> {
        let mut state = JobState::Submitted(handle);

        loop {
            state = self.step(state).await;

            match state {
                JobState::Ready(result) => return Ok(result),
                JobState::Failed(e) => return Err(e),
                JobState::Exhausted { handle, attempts } => {
                    log::warn!(
                        "Job {} did not finish after {attempts} polls, deleting",
                        handle.job_id
                    );
                    let cleanup = self.cleanup(&handle).await;
                    return Err(GeoprocessingError::Timeout {
                        job_id: handle.job_id,
                        attempts,
                        cleanup,
                    });
                }
                JobState::Polling { ref handle, attempt } => {
                    if attempt < self.policy.ceiling() {
                        tokio::time::sleep(self.policy.delay()).await;
                    } else {
                        log::trace!("Job {} reached the poll ceiling", handle.job_id);
                    }
                }
                JobState::Submitted(_) => {}
            }
        }
    }

    async fn cleanup(&self, handle: &JobHandle) -> JobCleanup {
        match self.service.cancel(&handle.job_id).await {
            Ok(()) => JobCleanup::Deleted,
            Err(e) => {
                log::warn!("Failed to delete job {}: {e}", handle.job_id);
                JobCleanup::NotDeleted
            }
        }
    }
}
