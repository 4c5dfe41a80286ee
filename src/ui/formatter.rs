//! Formatting for human-readable output.
//!
//! `format_*` functions build the text and are pure; `display_*` functions
//! print it. Styling goes through `console`, which drops colors when the
//! stream is not a terminal.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::domain::ReleasePlan;
use crate::publisher::PublishResult;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Summary of a planned release: previous tag, new tag, target commit.
pub fn format_plan(plan: &ReleasePlan) -> String {
    let mut out = String::new();
    match &plan.previous {
        Some(previous) => {
            out.push_str(&format!("{}\n", style("Proposed release:").bold()));
            out.push_str(&format!(
                "  From: {} ({})\n",
                style(&previous.name).red(),
                previous.commit.short()
            ));
            out.push_str(&format!("  To:   {}\n", style(plan.tag_name()).green()));
        }
        None => {
            out.push_str(&format!("{}\n", style("Initial release:").bold()));
            out.push_str(&format!("  New tag: {}\n", style(plan.tag_name()).green()));
        }
    }
    out.push_str(&format!(
        "  Commit: {}  ({} request)",
        plan.base_commit(),
        plan.kind
    ));
    out
}

pub fn display_plan(plan: &ReleasePlan) {
    println!("\n{}", format_plan(plan));
}

/// One line per publish step, then the failure if any.
pub fn format_publish_result(result: &PublishResult) -> Vec<String> {
    let mut lines = Vec::new();

    if result.tag_created {
        let note = if result.tag_preexisting {
            " (already on remote)"
        } else {
            ""
        };
        lines.push(format!(
            "{} Tag {} at {}{}",
            style("✓").green(),
            result.tag,
            result.commit.short(),
            note
        ));
    } else {
        lines.push(format!("{} Tag {} not published", style("✗").red(), result.tag));
    }

    if result.release_created {
        let note = if result.release_preexisting {
            " (already existed)"
        } else {
            ""
        };
        let url = result.release_url.as_deref().unwrap_or("");
        lines.push(format!("{} Release {}{}", style("✓").green(), url, note));
    } else if result.tag_created && result.failure.is_none() {
        lines.push(format!("{} Release skipped", style("→").yellow()));
    } else if result.tag_created {
        lines.push(format!("{} Release not created", style("✗").red()));
    }

    if let Some(failure) = &result.failure {
        lines.push(format!("{} {}", style("ERROR:").red().bold(), failure));
    }
    lines
}

pub fn display_publish_result(result: &PublishResult) {
    for warning in &result.warnings {
        display_boundary_warning(warning);
    }
    println!();
    for line in format_publish_result(result) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitId, RequestKind, TagRef, Version};

    fn plan(previous: Option<&str>) -> ReleasePlan {
        ReleasePlan {
            target: TagRef::new("v1.1.0", Version::new(1, 1, 0), CommitId::new("a".repeat(40))),
            kind: RequestKind::Minor,
            previous: previous.map(|name| {
                TagRef::new(name, Version::parse(name).unwrap(), CommitId::new("b".repeat(40)))
            }),
        }
    }

    #[test]
    fn test_format_plan_with_previous() {
        console::set_colors_enabled(false);
        let text = format_plan(&plan(Some("v1.0.0")));
        assert!(text.contains("From: v1.0.0 (bbbbbbb)"));
        assert!(text.contains("To:   v1.1.0"));
        assert!(text.contains("minor request"));
    }

    #[test]
    fn test_format_initial_plan() {
        console::set_colors_enabled(false);
        let text = format_plan(&plan(None));
        assert!(text.contains("Initial release:"));
        assert!(text.contains("New tag: v1.1.0"));
    }

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }
}
