//! Main workflow orchestration logic
//!
//! Sequences inspection, planning and publishing for one invocation and
//! turns the outcome into output and an exit code. Kept apart from clap so
//! the workflow can be driven programmatically and in tests.

use log::info;

use crate::boundary::BoundaryWarning;
use crate::domain::{ReleasePlan, ReleaseRequest, TagPattern, TagRef};
use crate::error::{ReleaseError, Result};
use crate::git::RepositoryHandle;
use crate::inspector::Inspector;
use crate::planner;
use crate::publisher::{PublishResult, Publisher};
use crate::remote::RemoteHandle;
use crate::report::Report;
use crate::ui;

/// Arguments for the release workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowArgs {
    pub request: ReleaseRequest,

    /// Preview mode - plan only, change nothing
    pub dry_run: bool,
}

/// A plan computed from the current history, not yet acted upon
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRelease {
    pub plan: ReleasePlan,
    pub warnings: Vec<BoundaryWarning>,
}

/// What a workflow run ended with
#[derive(Debug)]
pub enum WorkflowOutcome {
    DryRun(PreparedRelease),
    Published {
        prepared: PreparedRelease,
        result: PublishResult,
    },
}

impl WorkflowOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkflowOutcome::DryRun(_) => crate::error::exit_code::SUCCESS,
            WorkflowOutcome::Published { result, .. } => result.exit_code(),
        }
    }
}

/// Read the history and plan the next release. No side effects.
///
/// An explicit version whose tag already sits at HEAD as the newest release
/// is planned again, so an interrupted run can be finished by re-running it.
pub fn prepare<R>(repo: &R, request: &ReleaseRequest, pattern: &TagPattern) -> Result<PreparedRelease>
where
    R: RepositoryHandle,
{
    let inspector = Inspector::new(repo, pattern);
    let base_commit = inspector.head_commit()?;

    let mut listing = inspector.list_tags()?;
    let tags: Vec<TagRef> = listing.by_ref().collect();
    let mut warnings = listing.into_skipped();
    info!("Found {} version tag(s)", tags.len());

    let outcome = match planner::plan(&tags, request, &base_commit, pattern) {
        Ok(outcome) => outcome,
        Err(e) => match request {
            ReleaseRequest::Explicit(version) => {
                planner::resume(&tags, version, &base_commit, pattern).ok_or(e)?
            }
            ReleaseRequest::Bump(_) => return Err(e.into()),
        },
    };

    warnings.extend(outcome.warnings);
    Ok(PreparedRelease {
        plan: outcome.plan,
        warnings,
    })
}

/// Perform exactly one publish of a prepared release.
pub fn execute<R, H>(
    prepared: &PreparedRelease,
    repo: &R,
    remote: &H,
    publisher: &Publisher,
) -> PublishResult
where
    R: RepositoryHandle,
    H: RemoteHandle,
{
    info!("Publishing {}", prepared.plan.tag_name());
    publisher.publish(&prepared.plan, repo, remote)
}

/// Main release workflow
///
/// 1. Inspect tags and HEAD, plan the next release
/// 2. Stop there on a dry run
/// 3. Ask `confirm`; a refusal cancels the run
/// 4. Publish
///
/// # Returns
///
/// The outcome, including a publish failure recorded on the result, or
/// the error that stopped the run before publishing
pub fn run_release_workflow<R, H, C>(
    args: &WorkflowArgs,
    pattern: &TagPattern,
    repo: &R,
    remote: &H,
    publisher: &Publisher,
    confirm: C,
) -> Result<WorkflowOutcome>
where
    R: RepositoryHandle,
    H: RemoteHandle,
    C: FnOnce(&PreparedRelease) -> Result<bool>,
{
    let prepared = prepare(repo, &args.request, pattern)?;

    if args.dry_run {
        return Ok(WorkflowOutcome::DryRun(prepared));
    }

    if !confirm(&prepared)? {
        return Err(ReleaseError::Cancelled);
    }

    let result = execute(&prepared, repo, remote, publisher);
    Ok(WorkflowOutcome::Published { prepared, result })
}

/// Print the outcome as text or JSON and return the process exit code.
pub fn report_outcome(outcome: &Result<WorkflowOutcome>, json: bool) -> i32 {
    let report = match outcome {
        Ok(WorkflowOutcome::DryRun(prepared)) => Report::dry_run(&prepared.plan, &prepared.warnings),
        Ok(WorkflowOutcome::Published { prepared, result }) => {
            Report::published(&prepared.plan, result, &prepared.warnings)
        }
        Err(e) => Report::failed(e),
    };

    if json {
        match report.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                ui::display_error(&format!("Cannot render report: {}", e));
                return crate::error::exit_code::GENERAL;
            }
        }
        return report.exit_code;
    }

    match outcome {
        Ok(WorkflowOutcome::DryRun(prepared)) => {
            for warning in &prepared.warnings {
                ui::display_boundary_warning(warning);
            }
            ui::display_plan(&prepared.plan);
            ui::display_status("Dry run: no tag created, nothing pushed");
        }
        Ok(WorkflowOutcome::Published { prepared, result }) => {
            for warning in &prepared.warnings {
                ui::display_boundary_warning(warning);
            }
            ui::display_publish_result(result);
            if result.is_success() {
                ui::display_success(&format!("Published {}", result.tag));
            }
        }
        Err(ReleaseError::Cancelled) => println!("Operation cancelled by user."),
        Err(e) => ui::display_error(&e.to_string()),
    }
    report.exit_code
}
