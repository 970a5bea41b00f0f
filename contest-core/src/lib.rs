//! # contest-core
//!
//! Pure logic for the climbcontest kiosk (no I/O, instant tests).
//!
//! This crate implements the pairing state machine and the submission retry
//! policy without any network access or timers, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic transitions (token rotation aside)
//! - Easy reasoning about which response may touch which slot
//!
//! The actual I/O (HTTP calls, sleeping between attempts, display delays) is
//! performed by `contest-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod outcome;
pub mod retry;
pub mod session;
pub mod settings;

pub use outcome::{AttemptOutcome, SubmissionResult, ValidationFailure};
pub use retry::{
    RejectionPolicy, RetryPolicy, RetryTracker, Step, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use session::{
    Action, Event, IgnoreReason, KioskEvent, PairingSession, PairingSlot, ResetScope,
    ResolvedEntry, SessionStatus,
};
pub use settings::{SessionConfig, SubmitTrigger, DEFAULT_SUCCESS_DISPLAY};
