//! Bounded retry with fixed backoff for pair registration.
//!
//! [`RetryTracker`] folds a sequence of [`AttemptOutcome`]s into a single
//! [`SubmissionResult`]. It never sleeps: after each attempt it tells the
//! caller either to wait and try again, or that the loop is over.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::outcome::{AttemptOutcome, SubmissionResult};

/// Default number of registration attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between two registration attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(150);

/// What to do when the server answers `success: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionPolicy {
    /// Treat it like a transport failure and keep trying.
    #[default]
    Retry,
    /// Stop immediately with [`SubmissionResult::Rejected`].
    Terminal,
}

/// Retry bounds for the submission loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
    /// Fixed wait between attempts. Not applied after the last one.
    pub delay: Duration,
    /// Handling of a definitive `success: false`.
    pub on_rejection: RejectionPolicy,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` of 0 is raised to 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            on_rejection: RejectionPolicy::Retry,
        }
    }

    /// Set how a definitive rejection is handled.
    pub fn with_rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.on_rejection = policy;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Next move for the caller after recording an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Wait for the given delay, then attempt again.
    RetryAfter(Duration),
    /// Stop; this is the terminal result.
    Done(SubmissionResult),
}

/// Attempt counter for one submission.
#[derive(Debug, Clone)]
pub struct RetryTracker {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryTracker {
    /// Start tracking a fresh submission.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record the outcome of the attempt just made.
    pub fn record(&mut self, outcome: AttemptOutcome) -> Step {
        self.attempts = self.attempts.saturating_add(1);

        match outcome {
            AttemptOutcome::Accepted => Step::Done(SubmissionResult::Accepted),
            AttemptOutcome::Rejected if self.policy.on_rejection == RejectionPolicy::Terminal => {
                Step::Done(SubmissionResult::Rejected)
            }
            last if self.attempts >= self.policy.max_attempts => {
                Step::Done(SubmissionResult::GaveUp {
                    attempts: self.attempts,
                    last,
                })
            }
            _ => Step::RetryAfter(self.policy.delay),
        }
    }
}
