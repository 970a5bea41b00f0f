//! Server routing for the contest API.
//!
//! Every call is a POST under `/api/v{1,2}/contest/`. The version decides
//! both the sub-path for validation and whether requests carry the
//! session token.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Category, ParseError};

/// Contest API revision spoken by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy: `{id, uuid}` posted to `contest/<category>`.
    V1,
    /// Current: `{id}` posted to `contest/<category>/name`.
    #[default]
    V2,
}

impl ApiVersion {
    /// Path prefix shared by every endpoint, with trailing slash.
    pub fn base_path(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/v1/contest/",
            ApiVersion::V2 => "/api/v2/contest/",
        }
    }

    /// Whether every request must carry the session token.
    pub fn requires_token(&self) -> bool {
        matches!(self, ApiVersion::V1)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V1 => f.write_str("v1"),
            ApiVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            other => Err(ParseError::UnknownApiVersion(other.to_string())),
        }
    }
}

/// A remote operation on the contest server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Validate an identifier and resolve its display name.
    Name(Category),
    /// Register a climber/bloc pair.
    Register,
}

impl Endpoint {
    /// Path segment relative to [`ApiVersion::base_path`].
    pub fn path(&self, version: ApiVersion) -> String {
        match (self, version) {
            (Endpoint::Name(category), ApiVersion::V1) => category.as_str().to_string(),
            (Endpoint::Name(category), ApiVersion::V2) => format!("{}/name", category),
            (Endpoint::Register, _) => "success".to_string(),
        }
    }

    /// Absolute request path, e.g. `/api/v2/contest/climber/name`.
    pub fn url_path(&self, version: ApiVersion) -> String {
        format!("{}{}", version.base_path(), self.path(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_paths() {
        assert_eq!(
            Endpoint::Name(Category::Climber).path(ApiVersion::V2),
            "climber/name"
        );
        assert_eq!(Endpoint::Name(Category::Bloc).path(ApiVersion::V2), "bloc/name");
        assert_eq!(Endpoint::Register.path(ApiVersion::V2), "success");
    }

    #[test]
    fn v1_posts_directly_to_category() {
        assert_eq!(Endpoint::Name(Category::Climber).path(ApiVersion::V1), "climber");
        assert_eq!(Endpoint::Name(Category::Bloc).path(ApiVersion::V1), "bloc");
    }

    #[test]
    fn url_paths() {
        assert_eq!(
            Endpoint::Name(Category::Bloc).url_path(ApiVersion::V2),
            "/api/v2/contest/bloc/name"
        );
        assert_eq!(
            Endpoint::Register.url_path(ApiVersion::V1),
            "/api/v1/contest/success"
        );
    }

    #[test]
    fn base_paths() {
        assert_eq!(ApiVersion::V1.base_path(), "/api/v1/contest/");
        assert_eq!(ApiVersion::V2.base_path(), "/api/v2/contest/");
    }

    #[test]
    fn only_v1_requires_token() {
        assert!(ApiVersion::V1.requires_token());
        assert!(!ApiVersion::V2.requires_token());
    }

    #[test]
    fn version_parses() {
        assert_eq!("v1".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!("2".parse::<ApiVersion>().unwrap(), ApiVersion::V2);
        assert!("v3".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn default_is_v2() {
        assert_eq!(ApiVersion::default(), ApiVersion::V2);
    }
}
