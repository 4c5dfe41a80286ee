//! Turns a release plan into a pushed tag and a hosted release.
//!
//! Steps run in a fixed order: local tag, push, release. A failure stops
//! the sequence and is recorded on the [PublishResult]; nothing already
//! done is rolled back. Every step tolerates finding its work already
//! done at the planned commit, so a re-run converges.

use log::{debug, info};
use serde::Serialize;

use crate::boundary::BoundaryWarning;
use crate::domain::{CommitId, ReleasePlan, Version};
use crate::error::{exit_code, PublishError, RemoteErrorKind, TagLocation};
use crate::git::{RepositoryHandle, Tagger};
use crate::remote::{NewRelease, ReleaseInfo, RemoteHandle};
use crate::retry::RetryPolicy;

/// Text and switches applied while publishing
///
/// `tag_message`, `release_name` and `release_body` may use the `{tag}` and
/// `{version}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub tag_message: String,
    pub release_name: String,
    pub release_body: String,
    pub draft: bool,
    pub skip_release: bool,
    pub tagger: Option<Tagger>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        PublishOptions {
            tag_message: "Release {tag}".to_string(),
            release_name: "{tag}".to_string(),
            release_body: String::new(),
            draft: false,
            skip_release: false,
            tagger: None,
        }
    }
}

fn render(template: &str, plan: &ReleasePlan) -> String {
    template
        .replace("{tag}", plan.tag_name())
        .replace("{version}", &plan.version().to_string())
}

/// Outcome of one publish attempt
#[derive(Debug, Serialize)]
pub struct PublishResult {
    pub tag: String,
    pub version: Version,
    pub commit: CommitId,
    /// The remote holds the tag at the planned commit
    pub tag_created: bool,
    /// The remote already held it before this run
    pub tag_preexisting: bool,
    /// A release for the tag exists on the host
    pub release_created: bool,
    /// It existed before this run
    pub release_preexisting: bool,
    pub release_url: Option<String>,
    pub release_id: Option<u64>,
    #[serde(skip)]
    pub failure: Option<PublishError>,
    #[serde(skip)]
    pub warnings: Vec<BoundaryWarning>,
}

impl PublishResult {
    pub(crate) fn new(plan: &ReleasePlan) -> Self {
        PublishResult {
            tag: plan.tag_name().to_string(),
            version: plan.version().clone(),
            commit: plan.base_commit().clone(),
            tag_created: false,
            tag_preexisting: false,
            release_created: false,
            release_preexisting: false,
            release_url: None,
            release_id: None,
            failure: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        self.failure
            .as_ref()
            .map_or(exit_code::SUCCESS, PublishError::exit_code)
    }

    fn record_release(&mut self, info: ReleaseInfo, preexisting: bool) {
        self.release_created = true;
        self.release_preexisting = preexisting;
        self.release_url = Some(info.html_url);
        self.release_id = Some(info.id);
    }
}

/// Performs the side effects of a release
pub struct Publisher {
    policy: RetryPolicy,
    options: PublishOptions,
}

impl Publisher {
    pub fn new(policy: RetryPolicy, options: PublishOptions) -> Self {
        Publisher { policy, options }
    }

    /// Publish `plan`: tag locally, push the tag, create the release.
    ///
    /// Never fails outright; a failing step is reported through
    /// [PublishResult::failure] together with whatever already landed.
    pub fn publish<R, H>(&self, plan: &ReleasePlan, repo: &R, remote: &H) -> PublishResult
    where
        R: RepositoryHandle + ?Sized,
        H: RemoteHandle + ?Sized,
    {
        let mut result = PublishResult::new(plan);
        if let Err(e) = self.run_steps(plan, repo, remote, &mut result) {
            result.failure = Some(e);
        }
        result
    }

    fn run_steps<R, H>(
        &self,
        plan: &ReleasePlan,
        repo: &R,
        remote: &H,
        result: &mut PublishResult,
    ) -> Result<(), PublishError>
    where
        R: RepositoryHandle + ?Sized,
        H: RemoteHandle + ?Sized,
    {
        self.ensure_local_tag(plan, repo, result)?;
        self.push_tag(plan, remote, result)?;
        if self.options.skip_release {
            info!("Skipping release creation for {}", plan.tag_name());
            return Ok(());
        }
        self.create_release(plan, remote, result)
    }

    fn ensure_local_tag<R>(
        &self,
        plan: &ReleasePlan,
        repo: &R,
        result: &mut PublishResult,
    ) -> Result<(), PublishError>
    where
        R: RepositoryHandle + ?Sized,
    {
        let tag = plan.tag_name();
        let planned = plan.base_commit();

        match repo.tag_target(tag)? {
            Some(existing) if existing == *planned => {
                result.warnings.push(BoundaryWarning::LocalTagReused {
                    tag: tag.to_string(),
                });
                info!("Reusing local tag {} at {}", tag, planned.short());
                Ok(())
            }
            Some(existing) => Err(PublishError::TagConflict {
                tag: tag.to_string(),
                location: TagLocation::Local,
                existing,
                planned: planned.clone(),
            }),
            None => {
                let message = render(&self.options.tag_message, plan);
                repo.create_annotated_tag(tag, planned, &message, self.options.tagger.as_ref())?;
                info!("Created tag {} at {}", tag, planned.short());
                Ok(())
            }
        }
    }

    fn push_tag<H>(
        &self,
        plan: &ReleasePlan,
        remote: &H,
        result: &mut PublishResult,
    ) -> Result<(), PublishError>
    where
        H: RemoteHandle + ?Sized,
    {
        let tag = plan.tag_name();
        let planned = plan.base_commit();

        let failure = match self.policy.run("tag push", || remote.push_tag(tag, planned)) {
            Ok(()) => {
                info!("Pushed tag {}", tag);
                result.tag_created = true;
                return Ok(());
            }
            Err(failure) if failure.error.kind == RemoteErrorKind::AlreadyExists => failure,
            Err(failure) => return Err(failure.into_publish_error("tag push")),
        };

        debug!("push refused, comparing remote tag: {}", failure.error.message);
        let existing = self
            .policy
            .run("remote tag lookup", || remote.remote_tag_target(tag))
            .map_err(|f| f.into_publish_error("remote tag lookup"))?;

        match existing {
            Some(existing) if existing == *planned => {
                info!("Remote already has {} at {}", tag, planned.short());
                result.tag_created = true;
                result.tag_preexisting = true;
                result.warnings.push(BoundaryWarning::RemoteTagPresent {
                    tag: tag.to_string(),
                });
                Ok(())
            }
            Some(existing) => Err(PublishError::TagConflict {
                tag: tag.to_string(),
                location: TagLocation::Remote,
                existing,
                planned: planned.clone(),
            }),
            None => Err(PublishError::Rejected {
                operation: "tag push".to_string(),
                message: format!(
                    "{} (remote does not advertise the tag)",
                    failure.error.message
                ),
            }),
        }
    }

    fn create_release<H>(
        &self,
        plan: &ReleasePlan,
        remote: &H,
        result: &mut PublishResult,
    ) -> Result<(), PublishError>
    where
        H: RemoteHandle + ?Sized,
    {
        let tag = plan.tag_name();
        let release = NewRelease {
            tag_name: tag.to_string(),
            name: render(&self.options.release_name, plan),
            body: render(&self.options.release_body, plan),
            draft: self.options.draft,
            prerelease: plan.version().is_prerelease(),
        };

        let failure = match self
            .policy
            .run("release creation", || remote.create_release(&release))
        {
            Ok(info) => {
                info!("Created release {}", info.html_url);
                result.record_release(info, false);
                return Ok(());
            }
            Err(failure) if failure.error.kind == RemoteErrorKind::AlreadyExists => failure,
            Err(failure) => return Err(failure.into_publish_error("release creation")),
        };

        let found = self
            .policy
            .run("release lookup", || remote.find_release(tag))
            .map_err(|f| f.into_publish_error("release lookup"))?;

        match found {
            Some(info) => {
                info!("Release for {} already exists: {}", tag, info.html_url);
                result.record_release(info, true);
                result.warnings.push(BoundaryWarning::ReleaseAlreadyExists {
                    tag: tag.to_string(),
                });
                Ok(())
            }
            // Draft releases are not visible through the tag lookup.
            None => Err(PublishError::Rejected {
                operation: "release creation".to_string(),
                message: format!(
                    "{} (existing release not found by tag, it may be a draft)",
                    failure.error.message
                ),
            }),
        }
    }
}
