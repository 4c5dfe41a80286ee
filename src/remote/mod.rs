//! Remote side of a release: the git remote that receives the tag and the
//! hosting service that holds the release object.
//!
//! The [RemoteHandle] trait is the capability the publisher mutates the
//! outside world through. Implementations:
//!
//! - [live::LiveRemote]: git2 push plus the GitHub REST API
//! - [mock::InMemoryRemote]: an in-memory remote with failure injection for tests

pub mod git_remote;
pub mod github;
pub mod live;
pub mod mock;

use serde::{Deserialize, Serialize};

pub use git_remote::GitTagRemote;
pub use github::{GitHubClient, GitHubRepo};
pub use live::LiveRemote;
pub use mock::InMemoryRemote;

use crate::domain::CommitId;
use crate::error::RemoteError;

/// Release object to create on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// Release object as reported by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub id: u64,
    pub tag_name: String,
    pub html_url: String,
}

/// Remote operations needed to publish a release
///
/// Every method performs at most one network round trip; retrying is the
/// caller's business.
pub trait RemoteHandle {
    /// Push the local tag `tag`, which points at `target`, without forcing.
    ///
    /// Fails with [crate::error::RemoteErrorKind::AlreadyExists] when the
    /// remote already has a tag of that name, wherever it points.
    fn push_tag(&self, tag: &str, target: &CommitId) -> Result<(), RemoteError>;

    /// Commit the remote's tag points at, if the remote has it
    fn remote_tag_target(&self, tag: &str) -> Result<Option<CommitId>, RemoteError>;

    /// Create a hosted release for an already pushed tag
    fn create_release(&self, release: &NewRelease) -> Result<ReleaseInfo, RemoteError>;

    /// Look up the hosted release attached to `tag`
    fn find_release(&self, tag: &str) -> Result<Option<ReleaseInfo>, RemoteError>;
}
