use std::cell::RefCell;
use std::path::PathBuf;

use git2::{
    AutotagOption, Cred, CredentialType, ErrorClass, ErrorCode, FetchOptions, PushOptions,
    Remote, RemoteCallbacks, Repository,
};
use log::debug;

use crate::domain::CommitId;
use crate::error::RemoteError;

/// Stop offering credentials after this many rejected attempts; libgit2
/// keeps asking otherwise.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Where remote tags are fetched for inspection
const REMOTE_TAG_NAMESPACE: &str = "refs/github-tag-release/remote-tags";

/// Tag transport against one named git remote
pub struct GitTagRemote<'repo> {
    repo: &'repo Repository,
    remote_name: String,
    token: Option<String>,
}

impl<'repo> GitTagRemote<'repo> {
    pub fn new(repo: &'repo Repository, remote_name: impl Into<String>, token: Option<String>) -> Self {
        GitTagRemote {
            repo,
            remote_name: remote_name.into(),
            token,
        }
    }

    fn find_remote(&self) -> Result<Remote<'repo>, RemoteError> {
        self.repo.find_remote(&self.remote_name).map_err(|e| {
            RemoteError::rejected(format!(
                "cannot find remote '{}': {}",
                self.remote_name,
                e.message()
            ))
        })
    }

    /// Credentials callback: SSH keys, then the SSH agent, then the token
    /// over HTTPS, then whatever git's default helper offers.
    fn callbacks<'cb>(&self) -> RemoteCallbacks<'cb> {
        let token = self.token.clone();
        let mut attempts = 0;
        let mut callbacks = RemoteCallbacks::new();

        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Net,
                    "remote rejected all offered credentials",
                ));
            }
            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path: PathBuf = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = &token {
                    return Cred::userpass_plaintext("x-access-token", token);
                }
            }

            Cred::default()
        });
        callbacks
    }

    /// Push `refs/tags/<tag>` to the remote. Refuses up front when the
    /// remote already has the tag, so an existing tag is never replaced.
    pub fn push_tag(&self, tag: &str) -> Result<(), RemoteError> {
        if self.remote_tag_target(tag)?.is_some() {
            return Err(RemoteError::already_exists(format!(
                "remote '{}' already has tag '{}'",
                self.remote_name, tag
            )));
        }

        let mut remote = self.find_remote()?;
        let rejection: RefCell<Option<String>> = RefCell::new(None);
        {
            let mut callbacks = self.callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    *rejection.borrow_mut() = Some(format!("{}: {}", refname, status));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let refspec = format!("refs/tags/{0}:refs/tags/{0}", tag);
            debug!("pushing {} to {}", refspec, self.remote_name);
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(classify_git_error)?;
        }

        match rejection.into_inner() {
            Some(message) => Err(classify_rejection(message)),
            None => Ok(()),
        }
    }

    /// Ask the remote where its tag points.
    ///
    /// Fetches only that tag into a private namespace, never `refs/tags`,
    /// and peels it there. An empty remote or a missing tag is `Ok(None)`.
    pub fn remote_tag_target(&self, tag: &str) -> Result<Option<CommitId>, RemoteError> {
        let tracking = format!("{}/{}", REMOTE_TAG_NAMESPACE, tag);
        self.clear_tracking_ref(&tracking)?;

        let mut remote = self.find_remote()?;
        let mut options = FetchOptions::new();
        options
            .remote_callbacks(self.callbacks())
            .download_tags(AutotagOption::None)
            .update_fetchhead(false);

        let refspec = format!("+refs/tags/{}:{}", tag, tracking);
        debug!("fetching {} from {}", refspec, self.remote_name);
        match remote.fetch(&[refspec.as_str()], Some(&mut options), None) {
            Ok(()) => {}
            Err(e) if is_missing_remote_ref(&e) => return Ok(None),
            Err(e) => return Err(classify_git_error(e)),
        }

        let target = match self.repo.find_reference(&tracking) {
            Ok(reference) => reference.peel_to_commit().map(|commit| commit.id()).map_err(|e| {
                RemoteError::rejected(format!(
                    "remote tag '{}' does not point at a commit: {}",
                    tag,
                    e.message()
                ))
            })?,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(classify_git_error(e)),
        };

        self.clear_tracking_ref(&tracking)?;
        Ok(Some(target.into()))
    }

    fn clear_tracking_ref(&self, name: &str) -> Result<(), RemoteError> {
        match self.repo.find_reference(name) {
            Ok(mut reference) => reference.delete().map_err(classify_git_error),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
            Err(e) => Err(classify_git_error(e)),
        }
    }
}

fn is_missing_remote_ref(e: &git2::Error) -> bool {
    let lowered = e.message().to_lowercase();
    lowered.contains("couldn't find remote ref") || lowered.contains("could not find remote ref")
}

/// Map a libgit2 failure onto the retry taxonomy
pub fn classify_git_error(e: git2::Error) -> RemoteError {
    let message = e.message().to_string();
    let lowered = message.to_lowercase();

    match e.code() {
        ErrorCode::Auth => return RemoteError::auth(message),
        ErrorCode::Certificate => return RemoteError::rejected(message),
        ErrorCode::Exists | ErrorCode::NotFastForward => {
            return RemoteError::already_exists(message)
        }
        _ => {}
    }

    if lowered.contains("authentication")
        || lowered.contains("401")
        || lowered.contains("403")
        || lowered.contains("permission denied")
    {
        return RemoteError::auth(message);
    }

    match e.class() {
        ErrorClass::Net | ErrorClass::Http | ErrorClass::Os | ErrorClass::Ssl | ErrorClass::Ssh => {
            RemoteError::transient(message)
        }
        _ => RemoteError::rejected(message),
    }
}

/// Map a per-reference push status reported by the server
pub fn classify_rejection(message: String) -> RemoteError {
    let lowered = message.to_lowercase();
    if lowered.contains("already exists")
        || lowered.contains("non-fast-forward")
        || lowered.contains("fetch first")
    {
        RemoteError::already_exists(message)
    } else if lowered.contains("permission") || lowered.contains("denied") {
        RemoteError::auth(message)
    } else {
        RemoteError::rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteErrorKind;
    use crate::git::repository::tests::{commit_file, setup_test_repo};
    use crate::git::RepositoryHandle;
    use tempfile::TempDir;

    fn with_bare_origin() -> anyhow::Result<(TempDir, TempDir, crate::git::Git2Repository)> {
        let (work_dir, repo) = setup_test_repo()?;
        let origin_dir = TempDir::new()?;
        git2::Repository::init_bare(origin_dir.path())?;
        let url = origin_dir
            .path()
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-utf8 temp path"))?
            .to_string();
        repo.git2().remote("origin", &url)?;
        Ok((work_dir, origin_dir, repo))
    }

    #[test]
    fn test_push_tag_to_bare_remote() -> anyhow::Result<()> {
        let (_work, origin_dir, repo) = with_bare_origin()?;
        let head = repo.head_commit()?;
        repo.create_annotated_tag("v0.1.0", &head, "Release v0.1.0", None)?;
        let remote = GitTagRemote::new(repo.git2(), "origin", None);

        assert_eq!(remote.remote_tag_target("v0.1.0")?, None);
        remote.push_tag("v0.1.0")?;

        assert_eq!(remote.remote_tag_target("v0.1.0")?, Some(head.clone()));
        let origin = git2::Repository::open_bare(origin_dir.path())?;
        let pushed = origin
            .find_reference("refs/tags/v0.1.0")?
            .peel_to_commit()?;
        assert_eq!(CommitId::from(pushed.id()), head);
        Ok(())
    }

    #[test]
    fn test_push_existing_tag_reports_already_exists() -> anyhow::Result<()> {
        let (_work, origin_dir, repo) = with_bare_origin()?;
        let head = repo.head_commit()?;

        // Another publisher tagged a different commit on the remote first.
        let other = commit_file(repo.git2(), "Concurrent work")?;
        repo.git2()
            .branch("concurrent", &repo.git2().find_commit(other)?, false)?;
        repo.git2()
            .find_remote("origin")?
            .push(&["refs/heads/concurrent:refs/heads/concurrent"], None)?;
        let origin = git2::Repository::open_bare(origin_dir.path())?;
        origin.tag_lightweight("v0.1.0", &origin.find_object(other, None)?, false)?;

        repo.create_annotated_tag("v0.1.0", &head, "Release v0.1.0", None)?;
        let remote = GitTagRemote::new(repo.git2(), "origin", None);

        let err = remote.push_tag("v0.1.0").unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::AlreadyExists);
        assert_eq!(
            remote.remote_tag_target("v0.1.0")?,
            Some(CommitId::from(other))
        );
        Ok(())
    }

    #[test]
    fn test_annotated_remote_tag_is_peeled_without_leaking_tags() -> anyhow::Result<()> {
        let (_work, origin_dir, repo) = with_bare_origin()?;
        let origin = git2::Repository::open_bare(origin_dir.path())?;
        let sig = git2::Signature::now("Other", "other@example.com")?;
        let tree = origin.find_tree(origin.treebuilder(None)?.write()?)?;
        let remote_only = origin.commit(None, &sig, &sig, "Published elsewhere", &tree, &[])?;
        let object = origin.find_object(remote_only, None)?;
        origin.tag("v2.0.0", &object, &sig, "Release v2.0.0", false)?;
        origin.tag("v3.0.0", &object, &sig, "Release v3.0.0", false)?;

        let remote = GitTagRemote::new(repo.git2(), "origin", None);

        assert_eq!(
            remote.remote_tag_target("v2.0.0")?,
            Some(CommitId::from(remote_only))
        );
        assert_eq!(remote.remote_tag_target("v9.9.9")?, None);
        assert!(repo.tag_names()?.is_empty());
        assert!(repo
            .git2()
            .find_reference(&format!("{}/v2.0.0", REMOTE_TAG_NAMESPACE))
            .is_err());
        Ok(())
    }

    #[test]
    fn test_missing_remote_is_rejected() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let remote = GitTagRemote::new(repo.git2(), "upstream", None);
        let err = remote.remote_tag_target("v1.0.0").unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Rejected);
        assert!(err.message.contains("upstream"));
        Ok(())
    }

    #[test]
    fn test_classify_git_error() {
        let auth = git2::Error::new(ErrorCode::Auth, ErrorClass::Net, "bad credentials");
        assert_eq!(classify_git_error(auth).kind, RemoteErrorKind::Auth);

        let net = git2::Error::new(ErrorCode::GenericError, ErrorClass::Net, "connection reset");
        assert_eq!(classify_git_error(net).kind, RemoteErrorKind::Transient);

        let denied = git2::Error::new(
            ErrorCode::GenericError,
            ErrorClass::Http,
            "unexpected http status code: 403",
        );
        assert_eq!(classify_git_error(denied).kind, RemoteErrorKind::Auth);

        let exists = git2::Error::new(ErrorCode::NotFastForward, ErrorClass::Reference, "nff");
        assert_eq!(classify_git_error(exists).kind, RemoteErrorKind::AlreadyExists);

        let other = git2::Error::new(ErrorCode::GenericError, ErrorClass::Reference, "bad ref");
        assert_eq!(classify_git_error(other).kind, RemoteErrorKind::Rejected);
    }

    #[test]
    fn test_classify_rejection() {
        assert_eq!(
            classify_rejection("refs/tags/v1: already exists".to_string()).kind,
            RemoteErrorKind::AlreadyExists
        );
        assert_eq!(
            classify_rejection("refs/tags/v1: permission denied".to_string()).kind,
            RemoteErrorKind::Auth
        );
        assert_eq!(
            classify_rejection("refs/tags/v1: hook declined".to_string()).kind,
            RemoteErrorKind::Rejected
        );
    }
}
