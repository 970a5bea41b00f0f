//! Results of talking to the registry and submitting a pair.

use std::fmt;
use thiserror::Error;

/// Why a scanned identifier was not confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The registry answered and did not recognise the identifier.
    #[error("identifier rejected by registry")]
    Rejected,

    /// The registry could not be reached or answered garbage.
    #[error("registry unreachable: {0}")]
    Unreachable(String),
}

/// Classification of a single registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Server replied `success: true`.
    Accepted,
    /// Server replied, but `success` was false, absent, or not a boolean.
    Rejected,
    /// The request never produced a usable reply.
    TransportError(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Accepted => f.write_str("accepted"),
            AttemptOutcome::Rejected => f.write_str("rejected by server"),
            AttemptOutcome::TransportError(reason) => write!(f, "transport error: {}", reason),
        }
    }
}

/// Terminal result of a submission after the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// The pair was registered.
    Accepted,
    /// A definitive rejection stopped the loop early.
    ///
    /// Only produced under [`crate::RejectionPolicy::Terminal`].
    Rejected,
    /// Every attempt failed.
    GaveUp {
        /// Number of attempts made.
        attempts: u32,
        /// What the final attempt returned.
        last: AttemptOutcome,
    },
}

impl SubmissionResult {
    /// Whether the pair was registered.
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionResult::Accepted)
    }
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionResult::Accepted => f.write_str("accepted"),
            SubmissionResult::Rejected => f.write_str("rejected"),
            SubmissionResult::GaveUp { attempts, last } => {
                write!(f, "gave up after {} attempts (last: {})", attempts, last)
            }
        }
    }
}
