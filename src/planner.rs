//! Decides the next release tag from the existing history.

use std::cmp::Ordering;

use log::{debug, warn};

use crate::boundary::BoundaryWarning;
use crate::domain::{
    CommitId, ReleasePlan, ReleaseRequest, RequestKind, TagPattern, TagRef, Version,
};
use crate::error::PlanError;

/// A plan plus the ambiguities noticed while computing it
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: ReleasePlan,
    pub warnings: Vec<BoundaryWarning>,
}

/// Highest-precedence tag in listing order.
///
/// Among tags of equal precedence the one listed last wins. Equal versions
/// on different commits are reported as warnings.
pub fn highest_tag(tags: &[TagRef]) -> (Option<&TagRef>, Vec<BoundaryWarning>) {
    let mut highest: Option<&TagRef> = None;
    let mut warnings = Vec::new();

    for tag in tags {
        match highest {
            None => highest = Some(tag),
            Some(current) => match tag.version.compare(&current.version) {
                Ordering::Greater => highest = Some(tag),
                Ordering::Equal => {
                    if tag.commit != current.commit {
                        warnings.push(BoundaryWarning::DuplicateVersion {
                            version: tag.version.clone(),
                            kept: tag.name.clone(),
                            kept_commit: tag.commit.clone(),
                            shadowed: current.name.clone(),
                            shadowed_commit: current.commit.clone(),
                        });
                    }
                    highest = Some(tag);
                }
                Ordering::Less => {}
            },
        }
    }

    // Only ambiguity at the top affects the plan.
    if let Some(top) = highest {
        warnings.retain(|w| match w {
            BoundaryWarning::DuplicateVersion { version, .. } => *version == top.version,
            _ => true,
        });
    }
    (highest, warnings)
}

/// Compute the next release.
///
/// # Arguments
/// * `tags` - Version tags currently in the repository, in listing order
/// * `request` - Explicit version or bump kind
/// * `base_commit` - Commit the new tag will point at
/// * `pattern` - Naming pattern for the new tag
///
/// # Returns
/// * `Ok(PlanOutcome)` - The plan and any non-fatal warnings
/// * `Err(PlanError::NotAnIncrease)` - The target does not exceed the current version
/// * `Err(PlanError::TagExists)` - The target tag name is already taken
pub fn plan(
    tags: &[TagRef],
    request: &ReleaseRequest,
    base_commit: &CommitId,
    pattern: &TagPattern,
) -> Result<PlanOutcome, PlanError> {
    let (previous, warnings) = highest_tag(tags);
    for warning in &warnings {
        warn!("{}", warning);
    }

    let current = previous
        .map(|t| t.version.clone())
        .unwrap_or_else(|| Version::new(0, 0, 0));
    debug!(
        "current version {} ({})",
        current,
        previous.map(|t| t.name.as_str()).unwrap_or("no version tags")
    );

    let next = match request {
        ReleaseRequest::Explicit(version) => version.clone(),
        ReleaseRequest::Bump(kind) => current.bump(*kind),
    };

    if next.compare(&current) != Ordering::Greater {
        return Err(PlanError::NotAnIncrease {
            requested: next,
            current,
        });
    }

    let name = pattern.format(&next);
    if tags.iter().any(|t| t.name == name) {
        return Err(PlanError::TagExists { tag: name });
    }

    debug!("planned {} at {}", name, base_commit.short());
    Ok(PlanOutcome {
        plan: ReleasePlan {
            target: TagRef::new(name, next, base_commit.clone()),
            kind: request.kind(),
            previous: previous.cloned(),
        },
        warnings,
    })
}

/// Re-plan an explicit release whose tag an interrupted run already created.
///
/// Returns a plan only when the tag for `version` exists, points at
/// `base_commit`, and no higher version has been tagged since. Publishing
/// that plan again converges on the remote instead of failing.
pub fn resume(
    tags: &[TagRef],
    version: &Version,
    base_commit: &CommitId,
    pattern: &TagPattern,
) -> Option<PlanOutcome> {
    let name = pattern.format(version);
    let existing = tags.iter().rev().find(|t| t.name == name)?;
    if existing.commit != *base_commit {
        return None;
    }

    let (highest, _) = highest_tag(tags);
    if highest.map(|t| t.version.compare(version)) != Some(Ordering::Equal) {
        return None;
    }

    let others: Vec<TagRef> = tags.iter().filter(|t| t.name != name).cloned().collect();
    let (previous, mut warnings) = highest_tag(&others);
    let previous = previous.filter(|t| t.version.compare(version) == Ordering::Less);
    if previous.is_none() {
        warnings.clear();
    }

    debug!("resuming {} at {}", name, base_commit.short());
    Some(PlanOutcome {
        plan: ReleasePlan {
            target: existing.clone(),
            kind: RequestKind::Explicit,
            previous: previous.cloned(),
        },
        warnings,
    })
}
