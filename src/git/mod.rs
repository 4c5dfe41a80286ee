//! Local git operations abstraction layer
//!
//! The [RepositoryHandle] trait is the capability the inspector and the
//! publisher read and write local repository state through. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for tests
//!
//! Code that only needs tags and commits should depend on the trait so it
//! can be exercised without a repository on disk.
//!
//! ```rust
//! # use github_tag_release::git::RepositoryHandle;
//! # fn example<R: RepositoryHandle>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! let head = repo.head_commit()?;
//! for name in repo.tag_names()? {
//!     println!("{} -> {:?}", name, repo.tag_target(&name)?);
//! }
//! # let _ = head;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

use std::time::Duration;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::CommitId;
use crate::error::RepositoryError;

/// Identity recorded on annotated tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagger {
    pub name: String,
    pub email: String,
}

/// Common local git operations
pub trait RepositoryHandle {
    /// Names of all tags, in the order the repository lists them
    fn tag_names(&self) -> Result<Vec<String>, RepositoryError>;

    /// Commit a tag ultimately points at
    ///
    /// # Returns
    /// * `Ok(Some(commit))` - Tag exists and peels to a commit
    /// * `Ok(None)` - No tag with that name
    /// * `Err` - The tag exists but does not lead to a commit, or git failed
    fn tag_target(&self, name: &str) -> Result<Option<CommitId>, RepositoryError>;

    /// Commit checked out at HEAD
    ///
    /// Fails when HEAD cannot be resolved, e.g. a branch with no commits yet.
    fn head_commit(&self) -> Result<CommitId, RepositoryError>;

    /// Create an annotated tag object pointing at `target`
    ///
    /// Never overwrites: an existing tag of the same name is an error.
    fn create_annotated_tag(
        &self,
        name: &str,
        target: &CommitId,
        message: &str,
        tagger: Option<&Tagger>,
    ) -> Result<(), RepositoryError>;
}

/// Bound every git transport connection and read.
///
/// Must run before any remote is contacted.
pub fn configure_transport_timeout(timeout: Duration) -> Result<(), RepositoryError> {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    // SAFETY: called once from the entry point before any git transport is
    // created, so no other thread reads libgit2's global options concurrently.
    unsafe {
        git2::opts::set_server_connect_timeout_in_milliseconds(millis)?;
        git2::opts::set_server_timeout_in_milliseconds(millis)?;
    }
    Ok(())
}
