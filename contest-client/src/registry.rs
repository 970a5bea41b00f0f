//! Registry lookups: is this climber / bloc known, and what is it called?

use std::sync::Arc;

use climbcontest_core::{ResolvedEntry, ValidationFailure};
use climbcontest_types::{Category, Endpoint, Identifier, NameReply, NameRequest, SessionToken};
use tracing::{info, warn};

use crate::api::ApiConfig;
use crate::transport::Transport;

/// Validates scanned identifiers against the contest registry.
///
/// One lookup is one POST; there is no retry. A failed lookup leaves the
/// slot empty and the operator simply scans again.
pub struct RegistryClient<T: Transport> {
    transport: Arc<T>,
    api: ApiConfig,
}

impl<T: Transport> Clone for RegistryClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            api: self.api,
        }
    }
}

impl<T: Transport> RegistryClient<T> {
    /// Create a registry client over a shared transport.
    pub fn new(transport: Arc<T>, api: ApiConfig) -> Self {
        Self { transport, api }
    }

    /// Validate `id` as a member of `category`.
    ///
    /// `token` is only sent when the API revision or tagging asks for it.
    pub async fn resolve(
        &self,
        category: Category,
        id: &Identifier,
        token: SessionToken,
    ) -> Result<ResolvedEntry, ValidationFailure> {
        let request = NameRequest {
            id: id.clone(),
            uuid: self.api.token_for(token),
        };
        let payload = serde_json::to_value(&request)
            .map_err(|e| ValidationFailure::Unreachable(e.to_string()))?;
        let path = Endpoint::Name(category).url_path(self.api.version);

        let body = match self.transport.post(&path, &payload).await {
            Ok(body) => body,
            Err(e) => {
                warn!("{} {} lookup failed: {}", category, id, e);
                return Err(ValidationFailure::Unreachable(e.to_string()));
            }
        };

        let reply = NameReply::from_body(&body);
        if !reply.success {
            info!("{} {} not recognised by registry", category, id);
            return Err(ValidationFailure::Rejected);
        }

        info!(
            "{} {} confirmed as {}",
            category,
            id,
            reply.display_name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(ResolvedEntry {
            id: id.clone(),
            display_name: reply.display_name,
        })
    }
}
