//! Machine-readable outcome of a run, printed with `--json`.

use serde::Serialize;

use crate::boundary::BoundaryWarning;
use crate::domain::ReleasePlan;
use crate::error::{exit_code, PlanError, PublishError, ReleaseError};
use crate::publisher::PublishResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Published,
    DryRun,
    Failed,
}

/// Failure detail: a stable kind, the message, and the identifiers involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl FailureReport {
    fn from_publish(err: &PublishError) -> Self {
        let mut report = FailureReport::bare(err.kind(), err.to_string());
        match err {
            PublishError::TagConflict {
                tag,
                location,
                existing,
                planned,
            } => {
                report.tag = Some(tag.clone());
                report.location = Some(location.to_string());
                report.existing_commit = Some(existing.to_string());
                report.planned_commit = Some(planned.to_string());
            }
            PublishError::Network { attempts, .. } => report.attempts = Some(*attempts),
            _ => {}
        }
        report
    }

    fn from_release(err: &ReleaseError) -> Self {
        let bare = FailureReport::bare(err.kind(), err.to_string());
        match err {
            ReleaseError::Publish(e) => FailureReport::from_publish(e),
            ReleaseError::Parse(e) => FailureReport {
                requested_version: Some(e.input.clone()),
                ..bare
            },
            ReleaseError::Plan(PlanError::NotAnIncrease { requested, current }) => FailureReport {
                requested_version: Some(requested.to_string()),
                current_version: Some(current.to_string()),
                ..bare
            },
            ReleaseError::Plan(PlanError::TagExists { tag }) => FailureReport {
                tag: Some(tag.clone()),
                ..bare
            },
            _ => bare,
        }
    }

    /// Every publish failure names the release it was attempting
    fn for_plan(mut self, plan: &ReleasePlan) -> Self {
        if self.tag.is_none() {
            self.tag = Some(plan.tag_name().to_string());
        }
        self.version = Some(plan.version().to_string());
        self
    }

    fn bare(kind: &str, message: String) -> Self {
        FailureReport {
            kind: kind.to_string(),
            message,
            tag: None,
            version: None,
            requested_version: None,
            current_version: None,
            location: None,
            existing_commit: None,
            planned_commit: None,
            attempts: None,
        }
    }
}

/// Top-level JSON document
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub status: Status,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<&'a ReleasePlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a PublishResult>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
}

impl<'a> Report<'a> {
    pub fn dry_run(plan: &'a ReleasePlan, warnings: &[BoundaryWarning]) -> Self {
        Report {
            status: Status::DryRun,
            exit_code: exit_code::SUCCESS,
            plan: Some(plan),
            result: None,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            failure: None,
        }
    }

    pub fn published(
        plan: &'a ReleasePlan,
        result: &'a PublishResult,
        warnings: &[BoundaryWarning],
    ) -> Self {
        let failure = result
            .failure
            .as_ref()
            .map(|e| FailureReport::from_publish(e).for_plan(plan));
        Report {
            status: if failure.is_some() {
                Status::Failed
            } else {
                Status::Published
            },
            exit_code: result.exit_code(),
            plan: Some(plan),
            result: Some(result),
            warnings: warnings
                .iter()
                .chain(&result.warnings)
                .map(ToString::to_string)
                .collect(),
            failure,
        }
    }

    /// A run that stopped before anything was published
    pub fn failed(err: &ReleaseError) -> Self {
        Report {
            status: Status::Failed,
            exit_code: err.exit_code(),
            plan: None,
            result: None,
            warnings: Vec::new(),
            failure: Some(FailureReport::from_release(err)),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitId, RequestKind, TagRef, Version};
    use crate::error::{ParseError, RemoteError, TagLocation};
    use serde_json::Value;

    fn plan() -> ReleasePlan {
        ReleasePlan {
            target: TagRef::new("v1.0.0", Version::new(1, 0, 0), CommitId::new("a".repeat(40))),
            kind: RequestKind::Explicit,
            previous: None,
        }
    }

    #[test]
    fn test_dry_run_report() {
        let plan = plan();
        let json: Value = serde_json::from_str(&Report::dry_run(&plan, &[]).to_json().unwrap()).unwrap();

        assert_eq!(json["status"], "dry-run");
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["plan"]["target"]["name"], "v1.0.0");
        assert_eq!(json["plan"]["target"]["version"], "1.0.0");
        assert_eq!(json["plan"]["kind"], "explicit");
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn test_plan_failure_report_is_machine_readable() {
        let err: ReleaseError = PlanError::NotAnIncrease {
            requested: Version::new(1, 0, 0),
            current: Version::new(1, 2, 0),
        }
        .into();
        let json: Value = serde_json::from_str(&Report::failed(&err).to_json().unwrap()).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["exit_code"], exit_code::VALIDATION);
        assert_eq!(json["failure"]["kind"], "not-an-increase");
        assert_eq!(json["failure"]["requested_version"], "1.0.0");
        assert_eq!(json["failure"]["current_version"], "1.2.0");
        assert!(json["failure"]["message"]
            .as_str()
            .unwrap()
            .contains("1.2.0"));
    }

    #[test]
    fn test_parse_failure_report_names_the_input() {
        let err: ReleaseError = ParseError::new("1.2", "expected MAJOR.MINOR.PATCH").into();
        let json: Value = serde_json::from_str(&Report::failed(&err).to_json().unwrap()).unwrap();

        assert_eq!(json["exit_code"], exit_code::VALIDATION);
        assert_eq!(json["failure"]["kind"], "parse");
        assert_eq!(json["failure"]["requested_version"], "1.2");
    }

    #[test]
    fn test_publish_failure_report_names_the_release() {
        let plan = plan();
        let mut result = PublishResult::new(&plan);
        result.tag_created = true;
        result.failure = Some(PublishError::from_remote(
            "release",
            1,
            RemoteError::auth("bad credentials"),
        ));
        let json: Value =
            serde_json::from_str(&Report::published(&plan, &result, &[]).to_json().unwrap()).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["exit_code"], exit_code::AUTH);
        assert_eq!(json["failure"]["kind"], "auth");
        assert_eq!(json["failure"]["tag"], "v1.0.0");
        assert_eq!(json["failure"]["version"], "1.0.0");
    }

    #[test]
    fn test_conflict_report_names_both_commits() {
        let err = PublishError::TagConflict {
            tag: "v1.0.0".to_string(),
            location: TagLocation::Remote,
            existing: CommitId::new("b".repeat(40)),
            planned: CommitId::new("a".repeat(40)),
        };
        let report = FailureReport::from_publish(&err);

        assert_eq!(report.kind, "tag-conflict");
        assert_eq!(report.tag.as_deref(), Some("v1.0.0"));
        assert_eq!(report.location.as_deref(), Some("remote"));
        assert_eq!(report.existing_commit, Some("b".repeat(40)));
        assert_eq!(report.planned_commit, Some("a".repeat(40)));
    }
}
