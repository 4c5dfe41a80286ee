use crate::domain::CommitId;
use crate::error::RemoteError;
use crate::remote::{GitHubClient, GitTagRemote, NewRelease, ReleaseInfo, RemoteHandle};

/// The production remote: tags travel over git, releases over the REST API
pub struct LiveRemote<'repo> {
    git: GitTagRemote<'repo>,
    api: Option<GitHubClient>,
}

impl<'repo> LiveRemote<'repo> {
    /// `api` is `None` when releases are not being published
    pub fn new(git: GitTagRemote<'repo>, api: Option<GitHubClient>) -> Self {
        LiveRemote { git, api }
    }

    fn api(&self) -> Result<&GitHubClient, RemoteError> {
        self.api
            .as_ref()
            .ok_or_else(|| RemoteError::rejected("no release API configured"))
    }
}

impl RemoteHandle for LiveRemote<'_> {
    fn push_tag(&self, tag: &str, _target: &CommitId) -> Result<(), RemoteError> {
        self.git.push_tag(tag)
    }

    fn remote_tag_target(&self, tag: &str) -> Result<Option<CommitId>, RemoteError> {
        self.git.remote_tag_target(tag)
    }

    fn create_release(&self, release: &NewRelease) -> Result<ReleaseInfo, RemoteError> {
        self.api()?.create_release(release)
    }

    fn find_release(&self, tag: &str) -> Result<Option<ReleaseInfo>, RemoteError> {
        self.api()?.find_release(tag)
    }
}
