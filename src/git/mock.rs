use std::cell::RefCell;

use crate::domain::CommitId;
use crate::error::RepositoryError;
use crate::git::{RepositoryHandle, Tagger};

/// A tag recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTag {
    pub name: String,
    /// `None` models a tag that does not peel to a commit
    pub target: Option<CommitId>,
    pub message: Option<String>,
}

/// In-memory repository for tests without actual git operations
///
/// Tags are listed in insertion order.
#[derive(Debug, Default)]
pub struct MockRepository {
    head: Option<CommitId>,
    tags: RefCell<Vec<MockTag>>,
}

impl MockRepository {
    /// Create a new empty mock repository with no commits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock repository whose HEAD is `head`
    pub fn with_head(head: impl Into<String>) -> Self {
        MockRepository {
            head: Some(CommitId::new(head)),
            tags: RefCell::new(Vec::new()),
        }
    }

    /// Add a tag pointing at a commit
    pub fn add_tag(&self, name: impl Into<String>, commit: impl Into<String>) {
        self.tags.borrow_mut().push(MockTag {
            name: name.into(),
            target: Some(CommitId::new(commit)),
            message: None,
        });
    }

    /// Add a tag that cannot be resolved to a commit
    pub fn add_dangling_tag(&self, name: impl Into<String>) {
        self.tags.borrow_mut().push(MockTag {
            name: name.into(),
            target: None,
            message: None,
        });
    }

    /// Snapshot of the tags currently recorded
    pub fn tags(&self) -> Vec<MockTag> {
        self.tags.borrow().clone()
    }
}

impl RepositoryHandle for MockRepository {
    fn tag_names(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.tags.borrow().iter().map(|t| t.name.clone()).collect())
    }

    fn tag_target(&self, name: &str) -> Result<Option<CommitId>, RepositoryError> {
        match self.tags.borrow().iter().rev().find(|t| t.name == name) {
            Some(MockTag {
                target: Some(commit),
                ..
            }) => Ok(Some(commit.clone())),
            Some(_) => Err(RepositoryError::Git(git2::Error::from_str(&format!(
                "tag '{}' does not point at a commit",
                name
            )))),
            None => Ok(None),
        }
    }

    fn head_commit(&self) -> Result<CommitId, RepositoryError> {
        self.head.clone().ok_or_else(|| {
            RepositoryError::UnresolvedHead("current branch has no commits yet".to_string())
        })
    }

    fn create_annotated_tag(
        &self,
        name: &str,
        target: &CommitId,
        message: &str,
        _tagger: Option<&Tagger>,
    ) -> Result<(), RepositoryError> {
        let mut tags = self.tags.borrow_mut();
        if tags.iter().any(|t| t.name == name) {
            return Err(RepositoryError::TagCreation {
                tag: name.to_string(),
                reason: "tag already exists".to_string(),
            });
        }
        tags.push(MockTag {
            name: name.to_string(),
            target: Some(target.clone()),
            message: Some(message.to_string()),
        });
        Ok(())
    }
}
