//! Which contest API the kiosk speaks.

use climbcontest_types::{ApiVersion, SessionToken};

/// API revision plus request tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApiConfig {
    /// Server API revision.
    pub version: ApiVersion,
    /// Attach the session token to requests even when the revision does
    /// not require it, so the server can de-duplicate retried submissions.
    pub tag_requests: bool,
}

impl ApiConfig {
    /// Create a config for a revision, tagging only when it is required.
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            tag_requests: false,
        }
    }

    /// Set request tagging.
    pub fn with_tag_requests(mut self, tag: bool) -> Self {
        self.tag_requests = tag;
        self
    }

    /// The token to embed in a request body, if any.
    pub fn token_for(&self, token: SessionToken) -> Option<SessionToken> {
        (self.tag_requests || self.version.requires_token()).then_some(token)
    }
}
