use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use log::{debug, warn};

use github_tag_release::cli::{self, PreparedRelease, WorkflowArgs};
use github_tag_release::config::{self, Config};
use github_tag_release::domain::{BumpKind, ReleaseRequest, Version};
use github_tag_release::error::{exit_code, ReleaseError};
use github_tag_release::git::{self, Git2Repository, Tagger};
use github_tag_release::publisher::{PublishOptions, Publisher};
use github_tag_release::remote::{GitHubClient, GitHubRepo, GitTagRemote, LiveRemote};
use github_tag_release::retry::RetryPolicy;
use github_tag_release::ui;

#[derive(clap::Parser)]
#[command(
    name = "github-tag-release",
    version,
    about = "Tag the next semantic version and publish it as a GitHub release"
)]
#[command(group(ArgGroup::new("target").required(true).args(["bump", "set_version"])))]
struct Args {
    #[arg(long, value_name = "KIND", help = "Bump the highest existing version: major, minor or patch")]
    bump: Option<BumpKind>,

    #[arg(long, value_name = "VERSION", help = "Release exactly this version")]
    set_version: Option<String>,

    #[arg(short = 'C', long = "repo", value_name = "PATH", default_value = ".", help = "Repository to release from")]
    repo: PathBuf,

    #[arg(long, value_name = "NAME", help = "Git remote to push the tag to")]
    remote: Option<String>,

    #[arg(long, value_name = "OWNER/NAME", help = "Hosting repository (default: GITHUB_REPOSITORY or the remote URL)")]
    github_repo: Option<String>,

    #[arg(short, long, value_name = "FILE", help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, value_name = "TEXT", help = "Annotated tag message")]
    message: Option<String>,

    #[arg(long, value_name = "TEXT", help = "Release title")]
    release_name: Option<String>,

    #[arg(long, value_name = "TEXT", help = "Release description")]
    release_body: Option<String>,

    #[arg(long, help = "Create the release as a draft")]
    draft: bool,

    #[arg(long, help = "Push the tag without creating a release")]
    skip_release: bool,

    #[arg(long, value_name = "NAME", requires = "tagger_email", help = "Tagger name")]
    tagger_name: Option<String>,

    #[arg(long, value_name = "EMAIL", requires = "tagger_name", help = "Tagger email")]
    tagger_email: Option<String>,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, help = "Skip confirmation prompts")]
    yes: bool,

    #[arg(long, help = "Print a JSON report instead of text")]
    json: bool,

    #[arg(short, long, help = "Show debug logging")]
    verbose: bool,
}

impl Args {
    fn request(&self) -> std::result::Result<ReleaseRequest, ReleaseError> {
        match (&self.set_version, self.bump) {
            (Some(version), _) => Ok(ReleaseRequest::Explicit(Version::parse(version)?)),
            (None, Some(kind)) => Ok(ReleaseRequest::Bump(kind)),
            (None, None) => Err(ReleaseError::config(
                "one of --bump or --set-version is required",
            )),
        }
    }

    fn publish_options(&self, config: &Config) -> PublishOptions {
        let tagger = match (&self.tagger_name, &self.tagger_email) {
            (Some(name), Some(email)) => Some(Tagger {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        };
        PublishOptions {
            tag_message: self.message.clone().unwrap_or_else(|| config.tag_message.clone()),
            release_name: self
                .release_name
                .clone()
                .unwrap_or_else(|| config.release.name.clone()),
            release_body: self
                .release_body
                .clone()
                .unwrap_or_else(|| config.release.body.clone()),
            draft: self.draft || config.release.draft,
            skip_release: self.skip_release,
            tagger,
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .context("cannot initialise logging")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let code = match run(&args) {
        Ok(code) => code,
        Err(e) => cli::report_outcome(&Err(e), args.json),
    };
    if code != exit_code::SUCCESS {
        std::process::exit(code);
    }
    Ok(())
}

fn run(args: &Args) -> std::result::Result<i32, ReleaseError> {
    let request = args.request()?;

    let repo = Git2Repository::open(&args.repo)?;
    let project_dir = repo.git2().workdir().unwrap_or(args.repo.as_path());
    let config = config::load_config(args.config.as_deref(), project_dir)?;
    let pattern = config.tag_pattern()?;

    let timeout = Duration::from_secs(config.network.timeout_secs);
    git::configure_transport_timeout(timeout)?;
    let remote_name = args.remote.clone().unwrap_or_else(|| config.remote.clone());
    let token = config::github_token();

    let publish_release = !args.skip_release;
    if publish_release && !args.dry_run && token.is_none() {
        return Err(ReleaseError::config(
            "GITHUB_TOKEN (or GH_TOKEN) must be set to create a release; use --skip-release to push only the tag",
        ));
    }

    let api = if publish_release {
        match resolve_github_repo(args, &repo, &remote_name) {
            Ok(github_repo) => {
                debug!("releasing to {}", github_repo);
                Some(GitHubClient::new(
                    config::github_api_url(&config),
                    github_repo,
                    token.clone(),
                    timeout,
                ))
            }
            Err(e) if args.dry_run => {
                warn!("{}", e);
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    let remote = LiveRemote::new(GitTagRemote::new(repo.git2(), remote_name, token), api);
    let publisher = Publisher::new(RetryPolicy::from(&config.retry), args.publish_options(&config));
    let workflow = WorkflowArgs {
        request,
        dry_run: args.dry_run,
    };

    let json = args.json;
    let ask = !args.yes && !json && ui::is_interactive();
    let outcome = cli::run_release_workflow(
        &workflow,
        &pattern,
        &repo,
        &remote,
        &publisher,
        |prepared: &PreparedRelease| {
            if !json {
                ui::display_plan(&prepared.plan);
            }
            if ask {
                ui::confirm_action(&format!("Publish {}?", prepared.plan.tag_name()))
            } else {
                Ok(true)
            }
        },
    );

    Ok(cli::report_outcome(&outcome, json))
}

fn resolve_github_repo(
    args: &Args,
    repo: &Git2Repository,
    remote_name: &str,
) -> std::result::Result<GitHubRepo, ReleaseError> {
    if let Some(slug) = args.github_repo.as_deref() {
        return GitHubRepo::parse_slug(slug);
    }
    if let Some(slug) = config::github_repository() {
        return GitHubRepo::parse_slug(&slug);
    }
    match repo.remote_url(remote_name)? {
        Some(url) => GitHubRepo::from_remote_url(&url),
        None => Err(ReleaseError::config(format!(
            "cannot determine the GitHub repository: remote '{}' has no URL; pass --github-repo",
            remote_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_bump_and_version_are_exclusive() {
        assert!(Args::try_parse_from(["github-tag-release"]).is_err());
        assert!(
            Args::try_parse_from(["github-tag-release", "--bump", "patch", "--set-version", "1.0.0"])
                .is_err()
        );

        let args = Args::try_parse_from(["github-tag-release", "--set-version", "v2.0.0-rc.1"]).unwrap();
        assert_eq!(
            args.request().unwrap(),
            ReleaseRequest::Explicit(Version::parse("2.0.0-rc.1").unwrap())
        );
    }

    #[test]
    fn test_malformed_version_is_a_parse_error() {
        let args = Args::try_parse_from(["github-tag-release", "--set-version", "1.2"]).unwrap();
        let err = args.request().unwrap_err();

        assert!(matches!(err, ReleaseError::Parse(ref e) if e.input == "1.2"));
        assert_eq!(err.exit_code(), exit_code::VALIDATION);
    }

    #[test]
    fn test_invalid_bump_kind_is_a_usage_error() {
        let err = Args::try_parse_from(["github-tag-release", "--bump", "huge"])
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "github-tag-release",
            "--bump",
            "minor",
            "--message",
            "Ship {version}",
            "--tagger-name",
            "Release Bot",
            "--tagger-email",
            "bot@example.com",
        ])
        .unwrap();
        let options = args.publish_options(&Config::default());

        assert_eq!(options.tag_message, "Ship {version}");
        assert_eq!(options.release_name, "{tag}");
        assert_eq!(
            options.tagger,
            Some(Tagger {
                name: "Release Bot".to_string(),
                email: "bot@example.com".to_string()
            })
        );
    }
}
