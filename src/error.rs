use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{CommitId, Version};

/// A tag name that does not match the accepted version grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid version '{input}': {reason}")]
pub struct ParseError {
    pub input: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Local repository state could not be read or written
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Not a git repository: '{}'", path.display())]
    NotARepository { path: PathBuf },

    #[error("Cannot resolve HEAD: {0}")]
    UnresolvedHead(String),

    #[error("Cannot create tag '{tag}': {reason}")]
    TagCreation { tag: String, reason: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),
}

/// The requested release cannot be planned against the current history
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Version {requested} is not an increase over current version {current}")]
    NotAnIncrease { requested: Version, current: Version },

    #[error("Tag '{tag}' already exists")]
    TagExists { tag: String },
}

/// How a remote failure should be treated by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Network trouble, timeouts, 5xx and rate limiting. Retried.
    Transient,
    /// Credentials missing or refused.
    Auth,
    /// The remote refused the request for a reason retrying will not fix.
    Rejected,
    /// The object being created is already there.
    AlreadyExists,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::Transient => "transient",
            RemoteErrorKind::Auth => "auth",
            RemoteErrorKind::Rejected => "rejected",
            RemoteErrorKind::AlreadyExists => "already-exists",
        };
        f.write_str(label)
    }
}

/// Failure reported by a [`crate::remote::RemoteHandle`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} remote failure: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        RemoteError {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transient, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Auth, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Rejected, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::AlreadyExists, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind == RemoteErrorKind::Transient
    }
}

/// Where a conflicting tag was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLocation {
    Local,
    Remote,
}

impl fmt::Display for TagLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagLocation::Local => f.write_str("local"),
            TagLocation::Remote => f.write_str("remote"),
        }
    }
}

/// A publish step failed
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Tag '{tag}' already exists in the {location} repository at {existing}, expected {planned}")]
    TagConflict {
        tag: String,
        location: TagLocation,
        existing: CommitId,
        planned: CommitId,
    },

    #[error("Local tagging failed: {0}")]
    LocalTag(#[from] RepositoryError),

    #[error("Network failure during {operation} after {attempts} attempt(s): {message}")]
    Network {
        operation: String,
        attempts: u32,
        message: String,
    },

    #[error("Authentication failed during {operation}: {message}")]
    Auth { operation: String, message: String },

    #[error("Remote rejected {operation}: {message}")]
    Rejected { operation: String, message: String },
}

impl PublishError {
    /// Translate a remote failure into the publish taxonomy.
    pub fn from_remote(operation: &str, attempts: u32, err: RemoteError) -> Self {
        let operation = operation.to_string();
        match err.kind {
            RemoteErrorKind::Transient => PublishError::Network {
                operation,
                attempts,
                message: err.message,
            },
            RemoteErrorKind::Auth => PublishError::Auth {
                operation,
                message: err.message,
            },
            RemoteErrorKind::Rejected | RemoteErrorKind::AlreadyExists => {
                PublishError::Rejected {
                    operation,
                    message: err.message,
                }
            }
        }
    }

    /// Stable identifier for machine consumers
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::TagConflict { .. } => "tag-conflict",
            PublishError::LocalTag(_) => "repository",
            PublishError::Network { .. } => "network",
            PublishError::Auth { .. } => "auth",
            PublishError::Rejected { .. } => "rejected",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            PublishError::TagConflict { .. } => exit_code::CONFLICT,
            PublishError::LocalTag(_) => exit_code::REPOSITORY,
            PublishError::Network { .. } => exit_code::NETWORK,
            PublishError::Auth { .. } => exit_code::AUTH,
            PublishError::Rejected { .. } => exit_code::REJECTED,
        }
    }
}

/// Process exit codes
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const VALIDATION: i32 = 3;
    pub const CONFLICT: i32 = 4;
    pub const NETWORK: i32 = 5;
    pub const AUTH: i32 = 6;
    pub const REPOSITORY: i32 = 7;
    pub const REJECTED: i32 = 8;
}

/// Unified error type for a release invocation
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in github-tag-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Stable identifier for machine consumers
    pub fn kind(&self) -> &'static str {
        match self {
            ReleaseError::Config(_) => "config",
            ReleaseError::Parse(_) => "parse",
            ReleaseError::Repository(_) => "repository",
            ReleaseError::Plan(PlanError::NotAnIncrease { .. }) => "not-an-increase",
            ReleaseError::Plan(PlanError::TagExists { .. }) => "tag-exists",
            ReleaseError::Publish(e) => e.kind(),
            ReleaseError::Cancelled => "cancelled",
            ReleaseError::Io(_) => "io",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Config(_) | ReleaseError::Cancelled | ReleaseError::Io(_) => {
                exit_code::GENERAL
            }
            ReleaseError::Parse(_) | ReleaseError::Plan(_) => exit_code::VALIDATION,
            ReleaseError::Repository(_) => exit_code::REPOSITORY,
            ReleaseError::Publish(e) => e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(c: char) -> CommitId {
        CommitId::new(c.to_string().repeat(40))
    }

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("missing tag pattern");
        assert_eq!(err.to_string(), "Configuration error: missing tag pattern");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("1.2", "expected MAJOR.MINOR.PATCH");
        assert_eq!(
            err.to_string(),
            "Invalid version '1.2': expected MAJOR.MINOR.PATCH"
        );
    }

    #[test]
    fn test_plan_errors_map_to_validation() {
        let err: ReleaseError = PlanError::NotAnIncrease {
            requested: Version::new(1, 0, 0),
            current: Version::new(1, 2, 0),
        }
        .into();
        assert_eq!(err.kind(), "not-an-increase");
        assert_eq!(err.exit_code(), exit_code::VALIDATION);

        let err: ReleaseError = PlanError::TagExists {
            tag: "v1.0.0".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "tag-exists");
        assert_eq!(err.exit_code(), exit_code::VALIDATION);
    }

    #[test]
    fn test_remote_errors_map_by_kind() {
        let network = PublishError::from_remote("push", 4, RemoteError::transient("reset"));
        assert_eq!(network.kind(), "network");
        assert_eq!(network.exit_code(), exit_code::NETWORK);
        assert!(network.to_string().contains("4 attempt(s)"));

        let auth = PublishError::from_remote("push", 1, RemoteError::auth("bad token"));
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let rejected = PublishError::from_remote("release", 1, RemoteError::rejected("422"));
        assert_eq!(rejected.exit_code(), exit_code::REJECTED);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            exit_code::GENERAL,
            exit_code::VALIDATION,
            exit_code::CONFLICT,
            exit_code::NETWORK,
            exit_code::AUTH,
            exit_code::REPOSITORY,
            exit_code::REJECTED,
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, exit_code::SUCCESS);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_tag_conflict_names_both_commits() {
        let err = PublishError::TagConflict {
            tag: "v1.0.0".to_string(),
            location: TagLocation::Remote,
            existing: commit('a'),
            planned: commit('b'),
        };
        let msg = err.to_string();
        assert!(msg.contains("v1.0.0"));
        assert!(msg.contains("remote"));
        assert!(msg.contains(&"a".repeat(40)));
        assert!(msg.contains(&"b".repeat(40)));
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
