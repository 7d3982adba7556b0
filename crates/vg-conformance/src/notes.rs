#![forbid(unsafe_code)]

//! Rendering for the downstream notifier: release notes, failure
//! notices, publish notices.
//!
//! Pure string producers. Delivery (mail, chat, artifact upload) is a
//! collaborator's job; nothing here touches the filesystem or network.

use std::fmt::Write as _;

use vg_engine::EquivalenceReport;
use vg_gate::{release_tag, GateDecision, GateDetail, Version};

/// Markdown release notes for a version that passed the gate.
#[must_use]
pub fn render_release_notes(
    algorithm: &str,
    version: &Version,
    report: &EquivalenceReport,
) -> String {
    let mut notes = String::new();
    let _ = writeln!(notes, "# {algorithm} v{version} -- Release Notes");
    let _ = writeln!(notes);
    let _ = writeln!(notes, "## Equivalence Summary");
    let _ = writeln!(notes);
    let _ = writeln!(notes, "| Metric | Value |");
    let _ = writeln!(notes, "|--------|-------|");
    let _ = writeln!(notes, "| Total cases | {} |", report.total_cases);
    let _ = writeln!(notes, "| All passed | {} |", report.all_passed);
    let _ = writeln!(
        notes,
        "| Max absolute error | {:.2e} |",
        report.max_absolute_error
    );
    let _ = writeln!(
        notes,
        "| Max relative error | {:.2e} |",
        report.max_relative_error
    );
    let _ = writeln!(
        notes,
        "| Tolerance policy | {:?} |",
        report.tolerance_policy
    );
    let _ = writeln!(notes);
    let _ = writeln!(notes, "## Tag");
    let _ = writeln!(notes);
    let _ = writeln!(notes, "`{}`", release_tag(algorithm, version));
    notes
}

/// Failure notice body for the algorithm owners when the gate halts.
#[must_use]
pub fn render_failure_notice(algorithm: &str, decision: &GateDecision) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Subject: [FAILED] {algorithm} pipeline failure");
    let _ = writeln!(body);
    let _ = writeln!(body, "The release pipeline halted: {}.", decision.reason);

    match &decision.detail {
        Some(GateDetail::UpstreamFailure { stage, detail }) => {
            let _ = writeln!(body, "Failed stage: {stage}");
            if !detail.is_empty() {
                let _ = writeln!(body, "Detail: {detail}");
            }
            let _ = writeln!(
                body,
                "The equivalence check was not run; fix the stage above and push again."
            );
        }
        Some(GateDetail::Equivalence { summary }) => {
            let _ = writeln!(
                body,
                "Equivalence: {}/{} cases passed, max absolute error {:.2e}.",
                summary.passed_cases, summary.total_cases, summary.max_absolute_error
            );
            let _ = writeln!(
                body,
                "Reference and candidate outputs diverge beyond tolerance."
            );
        }
        None => {}
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "Nothing was versioned or published for this run.");
    body
}

/// Failure notice with per-case detail lines for the failing cases.
#[must_use]
pub fn render_failure_detail(algorithm: &str, report: &EquivalenceReport) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "{algorithm}: failing cases");
    for result in report.case_results.iter().filter(|r| !r.passed) {
        let _ = writeln!(
            body,
            "  {} max_abs={:.2e} (atol={:.0e})",
            result.case_name, result.max_absolute_error, result.tolerance_used.absolute
        );
    }
    body
}

/// Publish notice body for the consuming team when the gate proceeds.
#[must_use]
pub fn render_publish_notice(
    algorithm: &str,
    version: &Version,
    report: &EquivalenceReport,
) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Subject: {algorithm} v{version} published");
    let _ = writeln!(body);
    let _ = writeln!(body, "A new version of {algorithm} is available.");
    let _ = writeln!(
        body,
        "Equivalence: {}/{} cases passed (max err: {:.2e})",
        report.passed_cases, report.total_cases, report.max_absolute_error
    );
    let _ = writeln!(body, "Tag: {}", release_tag(algorithm, version));
    body
}
