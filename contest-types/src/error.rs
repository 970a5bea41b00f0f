//! Error types for the kiosk wire types.

use thiserror::Error;

/// Errors raised while turning raw input into typed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Category name is neither `climber` nor `bloc`
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Scanned identifier is empty after trimming
    #[error("identifier is empty")]
    EmptyIdentifier,

    /// API version string is not recognised
    #[error("unknown api version: {0}")]
    UnknownApiVersion(String),
}
