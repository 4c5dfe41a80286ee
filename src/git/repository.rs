use std::path::Path;

use git2::{ErrorCode, Oid, Repository as Git2Repo, Signature};
use log::debug;

use crate::domain::CommitId;
use crate::error::RepositoryError;
use crate::git::{RepositoryHandle, Tagger};

const FALLBACK_TAGGER_NAME: &str = "github-tag-release";
const FALLBACK_TAGGER_EMAIL: &str = "github-tag-release@localhost";

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|_| RepositoryError::NotARepository {
            path: path.to_path_buf(),
        })?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Underlying libgit2 handle, for transport operations
    pub fn git2(&self) -> &Git2Repo {
        &self.repo
    }

    /// URL configured for a remote, if the remote exists
    pub fn remote_url(&self, remote_name: &str) -> Result<Option<String>, RepositoryError> {
        match self.repo.find_remote(remote_name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn signature(&self, tagger: Option<&Tagger>) -> Result<Signature<'static>, RepositoryError> {
        if let Some(tagger) = tagger {
            return Ok(Signature::now(&tagger.name, &tagger.email)?);
        }
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(e) => {
                debug!("no git identity configured ({}), using fallback tagger", e);
                Ok(Signature::now(FALLBACK_TAGGER_NAME, FALLBACK_TAGGER_EMAIL)?)
            }
        }
    }
}

impl RepositoryHandle for Git2Repository {
    fn tag_names(&self) -> Result<Vec<String>, RepositoryError> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn tag_target(&self, name: &str) -> Result<Option<CommitId>, RepositoryError> {
        let reference_name = format!("refs/tags/{}", name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference.peel_to_commit()?;
                Ok(Some(commit.id().into()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn head_commit(&self) -> Result<CommitId, RepositoryError> {
        let head = self.repo.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch => {
                RepositoryError::UnresolvedHead("current branch has no commits yet".to_string())
            }
            _ => RepositoryError::UnresolvedHead(e.message().to_string()),
        })?;

        let commit = head
            .peel_to_commit()
            .map_err(|e| RepositoryError::UnresolvedHead(e.message().to_string()))?;
        Ok(commit.id().into())
    }

    fn create_annotated_tag(
        &self,
        name: &str,
        target: &CommitId,
        message: &str,
        tagger: Option<&Tagger>,
    ) -> Result<(), RepositoryError> {
        let creation_error = |reason: String| RepositoryError::TagCreation {
            tag: name.to_string(),
            reason,
        };

        let oid = Oid::from_str(target.as_str())
            .map_err(|e| creation_error(format!("invalid commit id '{}': {}", target, e)))?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| creation_error(format!("cannot find commit {}: {}", target, e)))?;
        let signature = self.signature(tagger)?;

        self.repo
            .tag(name, commit.as_object(), &signature, message, false)
            .map_err(|e| creation_error(e.message().to_string()))?;

        debug!("created annotated tag {} at {}", name, target.short());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn commit_file(repo: &Git2Repo, message: &str) -> anyhow::Result<Oid> {
        let sig = Signature::now("Test", "test@example.com")?;
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit()?],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        Ok(repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?)
    }

    pub(crate) fn setup_test_repo() -> anyhow::Result<(TempDir, Git2Repository)> {
        let dir = TempDir::new()?;
        let repo = Git2Repo::init(dir.path())?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test")?;
        config.set_str("user.email", "test@example.com")?;

        commit_file(&repo, "Initial commit")?;

        Ok((dir, Git2Repository::from_git2(repo)))
    }

    #[test]
    fn test_open_nonexistent_repository() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let result = Git2Repository::open(dir.path());
        assert!(matches!(
            result,
            Err(RepositoryError::NotARepository { .. })
        ));
    }

    #[test]
    fn test_head_commit_on_empty_repository_fails() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        Git2Repo::init(dir.path())?;
        let repo = Git2Repository::open(dir.path())?;

        assert!(matches!(
            repo.head_commit(),
            Err(RepositoryError::UnresolvedHead(_))
        ));
        Ok(())
    }

    #[test]
    fn test_empty_tag_listing() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        assert!(repo.tag_names()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_annotated_tag() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let head = repo.head_commit()?;

        repo.create_annotated_tag("v1.0.0", &head, "Release v1.0.0", None)?;

        assert_eq!(repo.tag_names()?, vec!["v1.0.0".to_string()]);
        assert_eq!(repo.tag_target("v1.0.0")?, Some(head));
        let reference = repo.git2().find_reference("refs/tags/v1.0.0")?;
        let tag = reference.peel_to_tag()?;
        assert_eq!(tag.message(), Some("Release v1.0.0"));
        Ok(())
    }

    #[test]
    fn test_create_tag_with_explicit_tagger() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let head = repo.head_commit()?;
        let tagger = Tagger {
            name: "Release Bot".to_string(),
            email: "bot@example.com".to_string(),
        };

        repo.create_annotated_tag("v0.1.0", &head, "Release", Some(&tagger))?;

        let tag = repo
            .git2()
            .find_reference("refs/tags/v0.1.0")?
            .peel_to_tag()?;
        let signature = tag.tagger().expect("annotated tag has a tagger");
        assert_eq!(signature.name(), Some("Release Bot"));
        assert_eq!(signature.email(), Some("bot@example.com"));
        Ok(())
    }

    #[test]
    fn test_duplicate_tag_is_not_overwritten() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let first = repo.head_commit()?;
        repo.create_annotated_tag("v1.0.0", &first, "First", None)?;

        let second: CommitId = commit_file(repo.git2(), "Second commit")?.into();
        let result = repo.create_annotated_tag("v1.0.0", &second, "Again", None);

        assert!(matches!(result, Err(RepositoryError::TagCreation { .. })));
        assert_eq!(repo.tag_target("v1.0.0")?, Some(first));
        Ok(())
    }

    #[test]
    fn test_tag_target_for_lightweight_tag() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let head = repo.git2().head()?.peel_to_commit()?;
        repo.git2()
            .tag_lightweight("marker", head.as_object(), false)?;

        assert_eq!(repo.tag_target("marker")?, Some(head.id().into()));
        assert_eq!(repo.tag_target("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_remote_url() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        assert_eq!(repo.remote_url("origin")?, None);

        repo.git2()
            .remote("origin", "https://github.com/owner/repo.git")?;
        assert_eq!(
            repo.remote_url("origin")?.as_deref(),
            Some("https://github.com/owner/repo.git")
        );
        Ok(())
    }
}
