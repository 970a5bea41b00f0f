//! Register one climber/bloc pair without the interactive kiosk.

use anyhow::Result;
use climbcontest_client::{ApiConfig, SubmissionEngine, Transport};
use climbcontest_core::{RetryPolicy, SubmissionResult};
use climbcontest_types::{Identifier, SessionToken};
use std::sync::Arc;

/// Run the register command.
///
/// Both identifiers are sent as given; they are not looked up first.
pub async fn run<T: Transport>(
    transport: T,
    api: ApiConfig,
    policy: RetryPolicy,
    bib: &str,
    bloc: &str,
) -> Result<()> {
    let bib = Identifier::new(bib)?;
    let bloc = Identifier::new(bloc)?;
    let engine = SubmissionEngine::new(Arc::new(transport), api, policy);

    println!(
        "Registering climber {} on bloc {} (up to {} attempts)...",
        bib, bloc, policy.max_attempts
    );
    match engine.submit(&bib, &bloc, SessionToken::new()).await {
        SubmissionResult::Accepted => {
            println!("  Registered.");
            Ok(())
        }
        failure => anyhow::bail!("Registration failed: {}", failure),
    }
}
