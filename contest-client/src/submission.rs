//! Pair registration with bounded retries.

use std::sync::Arc;

use climbcontest_core::{AttemptOutcome, RetryPolicy, RetryTracker, Step, SubmissionResult};
use climbcontest_types::{Endpoint, Identifier, RegistrationRequest, SessionToken, StatusReply};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ApiConfig;
use crate::transport::Transport;

/// Registers confirmed climber/bloc pairs.
///
/// Each call to [`SubmissionEngine::submit`] is a self-contained loop of at
/// most `policy.max_attempts` POSTs with a fixed pause between them.
pub struct SubmissionEngine<T: Transport> {
    transport: Arc<T>,
    api: ApiConfig,
    policy: RetryPolicy,
}

impl<T: Transport> Clone for SubmissionEngine<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            api: self.api,
            policy: self.policy,
        }
    }
}

impl<T: Transport> SubmissionEngine<T> {
    /// Create an engine over a shared transport.
    pub fn new(transport: Arc<T>, api: ApiConfig, policy: RetryPolicy) -> Self {
        Self {
            transport,
            api,
            policy,
        }
    }

    /// Retry bounds in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Register `climber` on `bloc`, retrying until accepted or out of attempts.
    pub async fn submit(
        &self,
        climber: &Identifier,
        bloc: &Identifier,
        token: SessionToken,
    ) -> SubmissionResult {
        let request = RegistrationRequest {
            bib: climber.clone(),
            bloc: bloc.clone(),
            uuid: self.api.token_for(token),
        };
        let payload = match serde_json::to_value(&request) {
            Ok(payload) => payload,
            Err(e) => {
                return SubmissionResult::GaveUp {
                    attempts: 0,
                    last: AttemptOutcome::TransportError(e.to_string()),
                }
            }
        };
        let path = Endpoint::Register.url_path(self.api.version);

        let mut tracker = RetryTracker::new(self.policy);
        loop {
            let outcome = self.attempt(&path, &payload).await;
            debug!(
                "registration attempt {} for {} on {}: {}",
                tracker.attempts() + 1,
                climber,
                bloc,
                outcome
            );

            match tracker.record(outcome) {
                Step::RetryAfter(delay) => tokio::time::sleep(delay).await,
                Step::Done(result) => {
                    if result.is_accepted() {
                        info!("registered {} on {}", climber, bloc);
                    } else {
                        warn!("registration of {} on {} failed: {}", climber, bloc, result);
                    }
                    return result;
                }
            }
        }
    }

    async fn attempt(&self, path: &str, payload: &Value) -> AttemptOutcome {
        match self.transport.post(path, payload).await {
            Ok(body) if StatusReply::from_body(&body).success => AttemptOutcome::Accepted,
            Ok(_) => AttemptOutcome::Rejected,
            Err(e) => AttemptOutcome::TransportError(e.to_string()),
        }
    }
}
