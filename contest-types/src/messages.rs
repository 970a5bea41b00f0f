//! JSON payloads exchanged with the contest server.
//!
//! Requests are strongly typed and serialized with serde. Replies are read
//! leniently from a parsed JSON body: the server has shipped several
//! revisions and a missing or mistyped field must degrade to "not
//! successful" rather than a hard parse error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Identifier, SessionToken};

/// Ask the registry to validate an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRequest {
    /// The scanned identifier
    pub id: Identifier,
    /// Session correlation token (always sent by v1, optional on v2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<SessionToken>,
}

/// Register a confirmed climber/bloc pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Climber identifier (bib)
    pub bib: Identifier,
    /// Bloc identifier
    pub bloc: Identifier,
    /// Session correlation token, for server-side dedup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<SessionToken>,
}

/// Reply to a [`NameRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameReply {
    /// `true` only when the body held a boolean `success: true`
    pub success: bool,
    /// Canonical display name; absent when missing or empty
    pub display_name: Option<String>,
}

impl NameReply {
    /// Read a reply out of a parsed JSON body.
    pub fn from_body(body: &Value) -> Self {
        Self {
            success: read_success(body),
            display_name: body
                .get("id")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

/// Reply to a [`RegistrationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusReply {
    /// `true` only when the body held a boolean `success: true`
    pub success: bool,
}

impl StatusReply {
    /// Read a reply out of a parsed JSON body.
    pub fn from_body(body: &Value) -> Self {
        Self {
            success: read_success(body),
        }
    }
}

/// Only a JSON boolean counts; the string `"true"` is not coerced.
fn read_success(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}
