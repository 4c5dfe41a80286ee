use std::fmt;

use crate::domain::{CommitId, Version};

/// Non-fatal conditions found while reading history or publishing.
/// These are reported to the user but never stop the run.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Tag exists but cannot be read as a version tag
    UnparsableTag { tag: String, reason: String },
    /// Two tags carry the same version but point at different commits
    DuplicateVersion {
        version: Version,
        kept: String,
        kept_commit: CommitId,
        shadowed: String,
        shadowed_commit: CommitId,
    },
    /// The local tag from an earlier run already points at the planned commit
    LocalTagReused { tag: String },
    /// The remote already had the tag at the planned commit
    RemoteTagPresent { tag: String },
    /// The hosted release for the tag already existed
    ReleaseAlreadyExists { tag: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Ignoring tag '{}': {}", tag, reason)
            }
            BoundaryWarning::DuplicateVersion {
                version,
                kept,
                kept_commit,
                shadowed,
                shadowed_commit,
            } => write!(
                f,
                "Version {} is tagged twice: using '{}' ({}) over '{}' ({})",
                version,
                kept,
                kept_commit.short(),
                shadowed,
                shadowed_commit.short()
            ),
            BoundaryWarning::LocalTagReused { tag } => {
                write!(f, "Local tag '{}' already points at the planned commit", tag)
            }
            BoundaryWarning::RemoteTagPresent { tag } => {
                write!(f, "Remote already has tag '{}' at the planned commit", tag)
            }
            BoundaryWarning::ReleaseAlreadyExists { tag } => {
                write!(f, "Release for tag '{}' already exists", tag)
            }
        }
    }
}
