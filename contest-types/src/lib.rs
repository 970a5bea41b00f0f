//! # climbcontest-types
//!
//! Wire format types for the climbcontest check-in kiosk.
//!
//! This crate provides the foundational types used across all kiosk crates:
//! - [`Category`], [`Identifier`], [`SessionToken`] - Identity and correlation types
//! - [`ApiVersion`], [`Endpoint`] - Server routing
//! - [`NameRequest`], [`RegistrationRequest`], [`NameReply`], [`StatusReply`] - JSON payloads
//! - [`ParseError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod endpoint;
mod error;
mod ids;
mod messages;

pub use endpoint::{ApiVersion, Endpoint};
pub use error::ParseError;
pub use ids::{Category, Identifier, SessionToken};
pub use messages::{NameReply, NameRequest, RegistrationRequest, StatusReply};
