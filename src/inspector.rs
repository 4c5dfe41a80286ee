//! Reads version tags and the head commit from a repository.

use log::{debug, warn};

use crate::boundary::BoundaryWarning;
use crate::domain::{CommitId, TagPattern, TagRef};
use crate::error::RepositoryError;
use crate::git::RepositoryHandle;

/// Read-only view of a repository's release history
pub struct Inspector<'a, R: RepositoryHandle> {
    repo: &'a R,
    pattern: &'a TagPattern,
}

impl<'a, R: RepositoryHandle> Inspector<'a, R> {
    pub fn new(repo: &'a R, pattern: &'a TagPattern) -> Self {
        Inspector { repo, pattern }
    }

    /// Start a fresh listing of the repository's version tags.
    ///
    /// Tags are resolved and parsed lazily as the listing is iterated.
    /// Names that are not version tags are skipped and collected as
    /// warnings on the listing.
    pub fn list_tags(&self) -> Result<TagListing<'a, R>, RepositoryError> {
        let names = self.repo.tag_names()?;
        debug!("repository lists {} tag(s)", names.len());

        Ok(TagListing {
            repo: self.repo,
            pattern: self.pattern,
            names: names.into_iter(),
            skipped: Vec::new(),
        })
    }

    pub fn head_commit(&self) -> Result<CommitId, RepositoryError> {
        self.repo.head_commit()
    }
}

/// Lazy sequence of [TagRef] produced by [Inspector::list_tags]
pub struct TagListing<'a, R: RepositoryHandle> {
    repo: &'a R,
    pattern: &'a TagPattern,
    names: std::vec::IntoIter<String>,
    skipped: Vec<BoundaryWarning>,
}

impl<R: RepositoryHandle> TagListing<'_, R> {
    /// Tags skipped so far
    pub fn skipped(&self) -> &[BoundaryWarning] {
        &self.skipped
    }

    pub fn into_skipped(self) -> Vec<BoundaryWarning> {
        self.skipped
    }

    fn skip(&mut self, tag: String, reason: String) {
        warn!("ignoring tag '{}': {}", tag, reason);
        self.skipped
            .push(BoundaryWarning::UnparsableTag { tag, reason });
    }

    fn resolve(&mut self, name: String) -> Option<TagRef> {
        let version = match self.pattern.extract_version(&name) {
            Ok(version) => version,
            Err(e) => {
                self.skip(name, e.reason);
                return None;
            }
        };

        match self.repo.tag_target(&name) {
            Ok(Some(commit)) => Some(TagRef::new(name, version, commit)),
            Ok(None) => {
                self.skip(name, "tag disappeared while listing".to_string());
                None
            }
            Err(e) => {
                self.skip(name, format!("cannot resolve target commit: {}", e));
                None
            }
        }
    }
}

impl<R: RepositoryHandle> Iterator for TagListing<'_, R> {
    type Item = TagRef;

    fn next(&mut self) -> Option<TagRef> {
        while let Some(name) = self.names.next() {
            if let Some(tag) = self.resolve(name) {
                return Some(tag);
            }
        }
        None
    }
}
