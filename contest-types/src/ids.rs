//! Identity and correlation types for the kiosk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/// Which of the two pairing slots a scan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A contestant, identified by the bib code.
    Climber,
    /// A climbing problem on the wall.
    Bloc,
}

impl Category {
    /// Both categories, climber first.
    pub const ALL: [Category; 2] = [Category::Climber, Category::Bloc];

    /// Lowercase wire name (`climber` or `bloc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Climber => "climber",
            Category::Bloc => "bloc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "climber" => Ok(Category::Climber),
            "bloc" | "block" => Ok(Category::Bloc),
            other => Err(ParseError::UnknownCategory(other.to_string())),
        }
    }
}

/// An opaque identifier read from a scanned code.
///
/// Identifiers are not unique across categories: climber `12` and bloc `12`
/// are different things. The category travels alongside, never inside.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Build an identifier from scanned text.
    ///
    /// Surrounding whitespace is stripped; an empty result is rejected.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyIdentifier);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = ParseError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?})", self.0)
    }
}

/// Correlation token for one pairing session.
///
/// UUID v4. Rotated on every reset so responses issued under an older
/// session can be recognised and dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(uuid::Uuid);

impl SessionToken {
    /// Create a new random token.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({})", &self.0.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names() {
        assert_eq!(Category::Climber.as_str(), "climber");
        assert_eq!(Category::Bloc.to_string(), "bloc");
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Climber".parse::<Category>().unwrap(), Category::Climber);
        assert_eq!(" BLOC ".parse::<Category>().unwrap(), Category::Bloc);
        assert_eq!("block".parse::<Category>().unwrap(), Category::Bloc);
    }

    #[test]
    fn category_rejects_unknown() {
        let err = "route".parse::<Category>().unwrap_err();
        assert_eq!(err, ParseError::UnknownCategory("route".into()));
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Bloc).unwrap();
        assert_eq!(json, "\"bloc\"");
    }

    #[test]
    fn identifier_trims_whitespace() {
        let id = Identifier::new("  12\n").unwrap();
        assert_eq!(id.as_str(), "12");
    }

    #[test]
    fn identifier_rejects_empty() {
        assert_eq!(Identifier::new("   "), Err(ParseError::EmptyIdentifier));
        assert_eq!(Identifier::new(""), Err(ParseError::EmptyIdentifier));
    }

    #[test]
    fn identifier_serializes_as_plain_string() {
        let id = Identifier::new("F3").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"F3\"");
    }

    #[test]
    fn identifier_deserializes_through_validation() {
        let id: Identifier = serde_json::from_str("\" F3 \"").unwrap();
        assert_eq!(id.as_str(), "F3");
        assert!(serde_json::from_str::<Identifier>("\"\"").is_err());
        assert!(serde_json::from_str::<Identifier>("\"   \"").is_err());
    }

    #[test]
    fn session_token_is_uuid_v4() {
        let token = SessionToken::new();
        assert_eq!(token.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn session_tokens_differ() {
        assert_ne!(SessionToken::new(), SessionToken::new());
    }

    #[test]
    fn session_token_debug_is_short() {
        let token = SessionToken::new();
        let debug = format!("{:?}", token);
        assert_eq!(debug.len(), "SessionToken(".len() + 8 + 1);
    }
}
