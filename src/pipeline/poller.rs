//! Polling of asynchronous text-detection jobs.
//!
//! The poller is a small state machine:
//!
//! ```text
//!            query                 query
//! Pending(0) ────▶ Pending(1) ─wait─▶ … ──▶ Succeeded(blocks)
//!                      │                └──▶ Failed(status)
//!                      └── attempts == max ──▶ PollTimeout error
//! ```
//!
//! Waiting goes through an injected [`Sleeper`] so tests drive the machine
//! without real time passing. Without `max_attempts` a job that never leaves
//! `Pending` is polled forever.

use crate::error::IdCheckError;
use crate::progress::VerificationProgressCallback;
use crate::services::{Block, JobId, JobStatus, TextDetectionJobs};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Suspends the poller between two status queries.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waiting on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// State of a job as seen by the poller.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Not terminal yet; `attempts` status queries have been made so far.
    Pending { attempts: u32 },
    Succeeded(Vec<Block>),
    Failed(String),
}

impl PollState {
    /// Fold the result of query number `attempts` into the next state.
    pub fn advance(attempts: u32, status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => PollState::Pending { attempts },
            JobStatus::Succeeded(blocks) => PollState::Succeeded(blocks),
            JobStatus::Failed(status) => PollState::Failed(status),
        }
    }
}

/// Terminal result of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(Vec<Block>),
    /// The service's terminal non-success status, verbatim.
    Failed(String),
}

/// Drives a job from submission to a terminal status.
pub struct JobPoller<'a> {
    jobs: &'a dyn TextDetectionJobs,
    sleeper: &'a dyn Sleeper,
    interval: Duration,
    max_attempts: Option<u32>,
    progress: Option<&'a dyn VerificationProgressCallback>,
}

impl<'a> JobPoller<'a> {
    pub fn new(jobs: &'a dyn TextDetectionJobs, sleeper: &'a dyn Sleeper, interval: Duration) -> Self {
        Self {
            jobs,
            sleeper,
            interval,
            max_attempts: None,
            progress: None,
        }
    }

    pub fn max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn progress(mut self, progress: Option<&'a dyn VerificationProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Query until the job is no longer pending.
    ///
    /// Waits exactly one `interval` between consecutive queries and never
    /// before the first. A failed job returns after the query that reported
    /// it; it is not retried.
    pub async fn wait(&self, job_id: &JobId) -> Result<JobOutcome, IdCheckError> {
        let mut state = PollState::Pending { attempts: 0 };

        loop {
            state = match state {
                PollState::Pending { attempts } => {
                    if attempts > 0 {
                        if let Some(max) = self.max_attempts {
                            if attempts >= max {
                                warn!("Job {} still pending after {} queries", job_id, attempts);
                                return Err(IdCheckError::PollTimeout {
                                    job_id: job_id.0.clone(),
                                    attempts,
                                });
                            }
                        }
                        self.sleeper.sleep(self.interval).await;
                    }

                    let attempt = attempts + 1;
                    let status = self.jobs.status(job_id).await?;
                    let next = PollState::advance(attempt, status);
                    if matches!(next, PollState::Pending { .. }) {
                        debug!("Job {} pending after query {}", job_id, attempt);
                        if let Some(cb) = self.progress {
                            cb.on_job_pending(&job_id.0, attempt);
                        }
                    }
                    next
                }
                PollState::Succeeded(blocks) => return Ok(JobOutcome::Succeeded(blocks)),
                PollState::Failed(status) => return Ok(JobOutcome::Failed(status)),
            };
        }
    }
}
