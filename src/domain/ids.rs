//! Validated identifier newtypes for projects and chat sessions

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum length for project and session identifiers
pub const MAX_ID_LENGTH: usize = 64;

/// Regex pattern for valid identifiers (alphanumeric, hyphens, underscores)
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap());

/// Identifier validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum IdValidationError {
    /// Identifier is empty
    Empty { kind: &'static str },
    /// Identifier exceeds maximum length
    TooLong {
        kind: &'static str,
        length: usize,
        max: usize,
    },
    /// Identifier contains invalid characters
    InvalidFormat { kind: &'static str, value: String },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{} ID cannot be empty", kind),
            Self::TooLong { kind, length, max } => {
                write!(f, "{} ID too long: {} characters (max {})", kind, length, max)
            }
            Self::InvalidFormat { kind, value } => {
                write!(
                    f,
                    "Invalid {} ID format '{}': must be alphanumeric with hyphens or underscores",
                    kind, value
                )
            }
        }
    }
}

impl std::error::Error for IdValidationError {}

fn validate_id(kind: &'static str, id: &str) -> Result<(), IdValidationError> {
    if id.is_empty() {
        return Err(IdValidationError::Empty { kind });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(IdValidationError::TooLong {
            kind,
            length: id.len(),
            max: MAX_ID_LENGTH,
        });
    }

    if !ID_PATTERN.is_match(id) {
        return Err(IdValidationError::InvalidFormat {
            kind,
            value: id.to_string(),
        });
    }

    Ok(())
}

/// Project identifier - scopes the knowledge base and published content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a new ProjectId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let id = id.into();
        validate_id("project", &id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat session identifier - scopes conversation history and content versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let id = id.into();
        validate_id("session", &id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
