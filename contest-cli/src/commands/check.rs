//! Look up one climber or bloc against the registry.

use anyhow::Result;
use climbcontest_client::{ApiConfig, RegistryClient, Transport};
use climbcontest_core::{ResolvedEntry, ValidationFailure};
use climbcontest_types::{Category, Identifier, SessionToken};
use std::sync::Arc;

/// Run the check command.
pub async fn run<T: Transport>(
    transport: T,
    api: ApiConfig,
    category: Category,
    raw_id: &str,
) -> Result<ResolvedEntry> {
    let id = Identifier::new(raw_id)?;
    let registry = RegistryClient::new(Arc::new(transport), api);

    println!("Checking {} {}...", category, id);
    match registry.resolve(category, &id, SessionToken::new()).await {
        Ok(entry) => {
            println!("  Known: {}", entry.label());
            Ok(entry)
        }
        Err(ValidationFailure::Rejected) => {
            anyhow::bail!("{} {} is not registered for this contest", category, id)
        }
        Err(ValidationFailure::Unreachable(reason)) => {
            anyhow::bail!("Server unreachable: {}", reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climbcontest_client::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn known_climber() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({ "success": true, "id": "Alice" }));

        let entry = run(transport, ApiConfig::default(), Category::Climber, "12")
            .await
            .unwrap();
        assert_eq!(entry.label(), "Alice");
    }

    #[tokio::test]
    async fn unknown_bloc_fails() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({ "success": false }));

        let err = run(transport, ApiConfig::default(), Category::Bloc, "Z9")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[tokio::test]
    async fn empty_id_is_refused_before_any_request() {
        let transport = MockTransport::new();
        let result = run(transport.clone(), ApiConfig::default(), Category::Bloc, " ").await;
        assert!(result.is_err());
        assert_eq!(transport.request_count(), 0);
    }
}
