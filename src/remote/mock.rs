use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::domain::CommitId;
use crate::error::RemoteError;
use crate::remote::{NewRelease, ReleaseInfo, RemoteHandle};

/// In-memory remote for tests
///
/// Behaves like a well-mannered server: an existing tag is never replaced
/// and a second release for the same tag is refused. Failures queued with
/// the `fail_next_*` methods are returned, in order, before the real
/// behavior resumes.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    tags: RefCell<HashMap<String, CommitId>>,
    releases: RefCell<Vec<ReleaseInfo>>,
    push_failures: RefCell<VecDeque<RemoteError>>,
    lookup_failures: RefCell<VecDeque<RemoteError>>,
    release_failures: RefCell<VecDeque<RemoteError>>,
    find_failures: RefCell<VecDeque<RemoteError>>,
    push_calls: Cell<u32>,
    release_calls: Cell<u32>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tag that some earlier publisher pushed
    pub fn with_tag(self, name: impl Into<String>, commit: impl Into<String>) -> Self {
        self.tags
            .borrow_mut()
            .insert(name.into(), CommitId::new(commit));
        self
    }

    /// Seed an existing release
    pub fn with_release(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let mut releases = self.releases.borrow_mut();
        let id = releases.len() as u64 + 1;
        releases.push(ReleaseInfo {
            id,
            html_url: release_url(&tag),
            tag_name: tag,
        });
        drop(releases);
        self
    }

    pub fn fail_next_push(&self, err: RemoteError) {
        self.push_failures.borrow_mut().push_back(err);
    }

    pub fn fail_next_lookup(&self, err: RemoteError) {
        self.lookup_failures.borrow_mut().push_back(err);
    }

    pub fn fail_next_release(&self, err: RemoteError) {
        self.release_failures.borrow_mut().push_back(err);
    }

    pub fn fail_next_find(&self, err: RemoteError) {
        self.find_failures.borrow_mut().push_back(err);
    }

    pub fn tag(&self, name: &str) -> Option<CommitId> {
        self.tags.borrow().get(name).cloned()
    }

    pub fn releases(&self) -> Vec<ReleaseInfo> {
        self.releases.borrow().clone()
    }

    /// Number of push attempts, failed ones included
    pub fn push_calls(&self) -> u32 {
        self.push_calls.get()
    }

    /// Number of release creation attempts, failed ones included
    pub fn release_calls(&self) -> u32 {
        self.release_calls.get()
    }
}

fn release_url(tag: &str) -> String {
    format!("https://github.com/owner/project/releases/tag/{}", tag)
}

fn next_failure(queue: &RefCell<VecDeque<RemoteError>>) -> Result<(), RemoteError> {
    match queue.borrow_mut().pop_front() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl RemoteHandle for InMemoryRemote {
    fn push_tag(&self, tag: &str, target: &CommitId) -> Result<(), RemoteError> {
        self.push_calls.set(self.push_calls.get() + 1);
        next_failure(&self.push_failures)?;

        let mut tags = self.tags.borrow_mut();
        if tags.contains_key(tag) {
            return Err(RemoteError::already_exists(format!(
                "refs/tags/{}: already exists",
                tag
            )));
        }
        tags.insert(tag.to_string(), target.clone());
        Ok(())
    }

    fn remote_tag_target(&self, tag: &str) -> Result<Option<CommitId>, RemoteError> {
        next_failure(&self.lookup_failures)?;
        Ok(self.tag(tag))
    }

    fn create_release(&self, release: &NewRelease) -> Result<ReleaseInfo, RemoteError> {
        self.release_calls.set(self.release_calls.get() + 1);
        next_failure(&self.release_failures)?;

        if !self.tags.borrow().contains_key(&release.tag_name) {
            return Err(RemoteError::rejected(format!(
                "HTTP 422: tag '{}' does not exist",
                release.tag_name
            )));
        }
        let mut releases = self.releases.borrow_mut();
        if releases.iter().any(|r| r.tag_name == release.tag_name) {
            return Err(RemoteError::already_exists(
                "HTTP 422: Validation Failed (already_exists)",
            ));
        }
        let info = ReleaseInfo {
            id: releases.len() as u64 + 1,
            tag_name: release.tag_name.clone(),
            html_url: release_url(&release.tag_name),
        };
        releases.push(info.clone());
        Ok(info)
    }

    fn find_release(&self, tag: &str) -> Result<Option<ReleaseInfo>, RemoteError> {
        next_failure(&self.find_failures)?;
        Ok(self
            .releases
            .borrow()
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned())
    }
}
