//! Error types for contest-client.

use climbcontest_types::ParseError;
use thiserror::Error;

/// Client errors.
///
/// Network failures never show up here: the registry client and the
/// submission engine turn them into typed outcomes. These are setup and
/// plumbing errors only.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server address could not be turned into a base URL.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// The HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    HttpSetup(String),

    /// Scanned text is not a usable identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] ParseError),

    /// The kiosk task has shut down.
    #[error("kiosk stopped")]
    KioskStopped,
}
