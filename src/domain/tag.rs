use std::fmt;

use serde::Serialize;

use crate::domain::Version;
use crate::error::{ParseError, ReleaseError};

const PLACEHOLDER: &str = "{version}";

/// Full hexadecimal id of a commit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        CommitId(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        CommitId(oid.to_string())
    }
}

/// A version tag bound to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    pub name: String,
    pub version: Version,
    pub commit: CommitId,
}

impl TagRef {
    pub fn new(name: impl Into<String>, version: Version, commit: CommitId) -> Self {
        TagRef {
            name: name.into(),
            version,
            commit,
        }
    }
}

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    prefix: String,
    suffix: String,
}

impl TagPattern {
    /// Create a new tag pattern
    ///
    /// The pattern must contain exactly one `{version}` placeholder.
    pub fn new(pattern: &str) -> Result<Self, ReleaseError> {
        let parts: Vec<&str> = pattern.split(PLACEHOLDER).collect();
        if parts.len() != 2 {
            return Err(ReleaseError::config(format!(
                "Invalid tag pattern '{}': should have exactly one {} placeholder",
                pattern, PLACEHOLDER
            )));
        }

        let pattern = TagPattern {
            prefix: parts[0].to_string(),
            suffix: parts[1].to_string(),
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Reject patterns that could never produce a valid git ref name
    fn validate(&self) -> Result<(), ReleaseError> {
        let invalid = |s: &str| {
            s.chars()
                .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
        };
        if invalid(&self.prefix) || invalid(&self.suffix) {
            return Err(ReleaseError::config(format!(
                "Invalid tag pattern '{}': contains characters not allowed in tag names",
                self
            )));
        }
        Ok(())
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        format!("{}{}{}", self.prefix, version, self.suffix)
    }

    /// Whether a tag name follows this pattern exactly
    pub fn matches(&self, tag: &str) -> bool {
        self.strip(tag)
            .map(|inner| Version::parse(inner).is_ok())
            .unwrap_or(false)
    }

    /// Extract the version carried by a tag name
    ///
    /// The pattern's prefix and suffix are removed when present; the rest
    /// must parse as a version on its own.
    pub fn extract_version(&self, tag: &str) -> Result<Version, ParseError> {
        let inner = self.strip(tag).unwrap_or(tag);
        Version::parse(inner)
    }

    fn strip<'a>(&self, tag: &'a str) -> Option<&'a str> {
        tag.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern {
            prefix: "v".to_string(),
            suffix: String::new(),
        }
    }
}

impl fmt::Display for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, PLACEHOLDER, self.suffix)
    }
}
