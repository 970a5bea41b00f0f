//! Session behaviour knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a successful registration stays on screen before the reset.
pub const DEFAULT_SUCCESS_DISPLAY: Duration = Duration::from_millis(500);

/// What starts a submission once both slots are confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitTrigger {
    /// Submit the instant the second slot is confirmed.
    #[default]
    Auto,
    /// Wait for an explicit submit intent from the operator.
    Manual,
}

/// Configuration for one [`crate::PairingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Keep the climber after a registration; only the bloc is cleared.
    pub auto_evaluate: bool,
    /// Auto or manual submission.
    pub submit_trigger: SubmitTrigger,
    /// Delay between acceptance and the post-outcome reset.
    pub success_display: Duration,
}

impl SessionConfig {
    /// Set the auto-evaluate flag.
    pub fn with_auto_evaluate(mut self, auto_evaluate: bool) -> Self {
        self.auto_evaluate = auto_evaluate;
        self
    }

    /// Set the submit trigger.
    pub fn with_submit_trigger(mut self, trigger: SubmitTrigger) -> Self {
        self.submit_trigger = trigger;
        self
    }

    /// Set the success display delay.
    pub fn with_success_display(mut self, delay: Duration) -> Self {
        self.success_display = delay;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_evaluate: false,
            submit_trigger: SubmitTrigger::Auto,
            success_display: DEFAULT_SUCCESS_DISPLAY,
        }
    }
}
