use std::fmt;

use serde::Serialize;

use crate::domain::{BumpKind, CommitId, TagRef, Version};

/// What the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseRequest {
    Explicit(Version),
    Bump(BumpKind),
}

impl ReleaseRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            ReleaseRequest::Explicit(_) => RequestKind::Explicit,
            ReleaseRequest::Bump(BumpKind::Major) => RequestKind::Major,
            ReleaseRequest::Bump(BumpKind::Minor) => RequestKind::Minor,
            ReleaseRequest::Bump(BumpKind::Patch) => RequestKind::Patch,
        }
    }
}

/// How the planned version was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Explicit,
    Major,
    Minor,
    Patch,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Explicit => f.write_str("explicit"),
            RequestKind::Major => f.write_str("major"),
            RequestKind::Minor => f.write_str("minor"),
            RequestKind::Patch => f.write_str("patch"),
        }
    }
}

/// The next tag to publish. Built once by the planner, consumed by the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasePlan {
    pub target: TagRef,
    pub kind: RequestKind,
    /// Highest version tag seen while planning, `None` for a first release
    pub previous: Option<TagRef>,
}

impl ReleasePlan {
    pub fn tag_name(&self) -> &str {
        &self.target.name
    }

    pub fn version(&self) -> &Version {
        &self.target.version
    }

    pub fn base_commit(&self) -> &CommitId {
        &self.target.commit
    }
}
