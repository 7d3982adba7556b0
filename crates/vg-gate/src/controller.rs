#![forbid(unsafe_code)]

//! Pipeline gating state machine.
//!
//! States advance `AwaitingBuild → AwaitingTests → AwaitingEquivalence →
//! Decided`. A failed upstream stage short-circuits straight to a halt
//! decision: equivalence checking against a broken build is meaningless
//! and wastes evaluation time.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vg_engine::EquivalenceReport;
use vg_runtime::now_unix_ms;

use crate::evidence::{GateEvidenceEntry, GateEvidenceLedger};

/// Terminal verdict of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Proceed,
    Halt,
}

/// Gate controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    AwaitingBuild,
    AwaitingTests,
    AwaitingEquivalence,
    Decided,
}

/// Outcome of one upstream pipeline stage, supplied as a black box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl StageOutcome {
    #[must_use]
    pub fn passed(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            success: true,
            detail: String::new(),
        }
    }

    #[must_use]
    pub fn failed(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            success: false,
            detail: detail.into(),
        }
    }
}

/// Compact view of an equivalence report, embedded in halt decisions so
/// the notifier has the numbers without re-reading the full artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub algorithm: String,
    pub all_passed: bool,
    pub total_cases: usize,
    pub passed_cases: usize,
    pub failed_cases: usize,
    pub max_absolute_error: f64,
}

impl From<&EquivalenceReport> for ReportSummary {
    fn from(report: &EquivalenceReport) -> Self {
        Self {
            algorithm: report.algorithm.clone(),
            all_passed: report.all_passed,
            total_cases: report.total_cases,
            passed_cases: report.passed_cases,
            failed_cases: report.failed_cases,
            max_absolute_error: report.max_absolute_error,
        }
    }
}

/// What caused the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateDetail {
    UpstreamFailure { stage: String, detail: String },
    Equivalence { summary: ReportSummary },
}

/// The terminal decision of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub outcome: GateOutcome,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<GateDetail>,
    pub decided_unix_ms: u128,
}

/// Protocol misuse of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("gate already decided; decisions are terminal")]
    AlreadyDecided,
    #[error("stage `{got}` fed out of order; controller is awaiting {expected:?}")]
    InvalidStage { expected: GateState, got: String },
}

/// Pipeline gating state machine with a bounded decision audit trail.
#[derive(Debug, Clone)]
pub struct GateController {
    state: GateState,
    decision: Option<GateDecision>,
    ledger: GateEvidenceLedger,
}

impl GateController {
    #[must_use]
    pub fn new(ledger_capacity: usize) -> Self {
        Self {
            state: GateState::AwaitingBuild,
            decision: None,
            ledger: GateEvidenceLedger::new(ledger_capacity),
        }
    }

    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub fn decision(&self) -> Option<&GateDecision> {
        self.decision.as_ref()
    }

    #[must_use]
    pub const fn ledger(&self) -> &GateEvidenceLedger {
        &self.ledger
    }

    /// Feed the build stage outcome.
    ///
    /// Returns the decision when the stage failure short-circuits the
    /// pipeline, `None` when the controller advances to the next stage.
    pub fn record_build(
        &mut self,
        outcome: &StageOutcome,
    ) -> Result<Option<&GateDecision>, GateError> {
        self.expect_state(GateState::AwaitingBuild, &outcome.stage)?;
        if outcome.success {
            self.transition(GateState::AwaitingTests, outcome, "build succeeded");
            return Ok(None);
        }
        Ok(Some(self.decide(
            GateOutcome::Halt,
            "build failure",
            Some(GateDetail::UpstreamFailure {
                stage: outcome.stage.clone(),
                detail: outcome.detail.clone(),
            }),
        )))
    }

    /// Feed the local-test stage outcome.
    pub fn record_local_tests(
        &mut self,
        outcome: &StageOutcome,
    ) -> Result<Option<&GateDecision>, GateError> {
        self.expect_state(GateState::AwaitingTests, &outcome.stage)?;
        if outcome.success {
            self.transition(GateState::AwaitingEquivalence, outcome, "local tests passed");
            return Ok(None);
        }
        Ok(Some(self.decide(
            GateOutcome::Halt,
            "local test failure",
            Some(GateDetail::UpstreamFailure {
                stage: outcome.stage.clone(),
                detail: outcome.detail.clone(),
            }),
        )))
    }

    /// Feed the equivalence report and reach the terminal decision.
    pub fn record_equivalence(
        &mut self,
        report: &EquivalenceReport,
    ) -> Result<&GateDecision, GateError> {
        self.expect_state(GateState::AwaitingEquivalence, "equivalence")?;
        let summary = ReportSummary::from(report);
        if report.all_passed {
            Ok(self.decide(
                GateOutcome::Proceed,
                "all equivalence cases passed within tolerance",
                Some(GateDetail::Equivalence { summary }),
            ))
        } else {
            Ok(self.decide(
                GateOutcome::Halt,
                "equivalence-failure",
                Some(GateDetail::Equivalence { summary }),
            ))
        }
    }

    fn expect_state(&self, expected: GateState, got: &str) -> Result<(), GateError> {
        if self.state == GateState::Decided {
            return Err(GateError::AlreadyDecided);
        }
        if self.state != expected {
            return Err(GateError::InvalidStage {
                expected: self.state,
                got: got.to_owned(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: GateState, outcome: &StageOutcome, note: &str) {
        self.ledger.record(GateEvidenceEntry {
            state: self.state,
            stage: outcome.stage.clone(),
            outcome: None,
            note: note.to_owned(),
            timestamp_ms: now_unix_ms(),
        });
        self.state = next;
    }

    fn decide(
        &mut self,
        outcome: GateOutcome,
        reason: &str,
        detail: Option<GateDetail>,
    ) -> &GateDecision {
        self.ledger.record(GateEvidenceEntry {
            state: self.state,
            stage: String::from("decision"),
            outcome: Some(outcome),
            note: reason.to_owned(),
            timestamp_ms: now_unix_ms(),
        });
        self.state = GateState::Decided;
        self.decision.insert(GateDecision {
            outcome,
            reason: reason.to_owned(),
            detail,
            decided_unix_ms: now_unix_ms(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_engine::compare;
    use vg_runtime::PipelineDefaults;

    use vg_adapters::{ImplementationTag, ObservedOutput};
    use vg_vectors::{FieldMap, FieldValue, Suite, TestCase, ToleranceSpec};

    fn report(all_pass: bool) -> EquivalenceReport {
        let state = vec![1.0, 0.0];
        let candidate_state = if all_pass {
            vec![1.0, 0.0]
        } else {
            vec![1.01, 0.0]
        };
        let suite = Suite {
            algorithm: "two_state_estimator".to_owned(),
            global_tolerance: Some(ToleranceSpec::absolute(1e-10)),
            test_cases: vec![TestCase {
                name: "nominal".to_owned(),
                description: String::new(),
                inputs: FieldMap::from([(
                    "state".to_owned(),
                    FieldValue::Vector(state.clone()),
                )]),
                expected_output: FieldMap::from([(
                    "updated_state".to_owned(),
                    FieldValue::Vector(state.clone()),
                )]),
                tolerance: None,
            }],
        }
        .validate()
        .expect("valid suite");

        let reference = vec![ObservedOutput {
            case_name: "nominal".to_owned(),
            source: ImplementationTag::Reference,
            adapter_id: "ref".to_owned(),
            fields: FieldMap::from([(
                "updated_state".to_owned(),
                FieldValue::Vector(state),
            )]),
        }];
        let candidate = vec![ObservedOutput {
            case_name: "nominal".to_owned(),
            source: ImplementationTag::Candidate,
            adapter_id: "cand".to_owned(),
            fields: FieldMap::from([(
                "updated_state".to_owned(),
                FieldValue::Vector(candidate_state),
            )]),
        }];
        compare(&reference, &candidate, &suite, &PipelineDefaults::default())
            .expect("comparison pairs")
    }

    #[test]
    fn happy_path_proceeds_on_passing_report() {
        let mut gate = GateController::new(16);
        assert_eq!(gate.state(), GateState::AwaitingBuild);

        assert!(gate
            .record_build(&StageOutcome::passed("build"))
            .expect("in order")
            .is_none());
        assert_eq!(gate.state(), GateState::AwaitingTests);

        assert!(gate
            .record_local_tests(&StageOutcome::passed("local-tests"))
            .expect("in order")
            .is_none());
        assert_eq!(gate.state(), GateState::AwaitingEquivalence);

        let decision = gate.record_equivalence(&report(true)).expect("in order");
        assert_eq!(decision.outcome, GateOutcome::Proceed);
        assert_eq!(gate.state(), GateState::Decided);
    }

    #[test]
    fn build_failure_short_circuits_with_reason() {
        let mut gate = GateController::new(16);
        let decision = gate
            .record_build(&StageOutcome::failed("build", "cmake configure failed"))
            .expect("in order")
            .expect("failure decides")
            .clone();
        assert_eq!(decision.outcome, GateOutcome::Halt);
        assert_eq!(decision.reason, "build failure");
        match decision.detail {
            Some(GateDetail::UpstreamFailure { stage, detail }) => {
                assert_eq!(stage, "build");
                assert_eq!(detail, "cmake configure failed");
            }
            other => panic!("unexpected detail: {other:?}"),
        }

        // The engine stage is never reachable after the short-circuit.
        let err = gate
            .record_equivalence(&report(true))
            .expect_err("decision is terminal");
        assert_eq!(err, GateError::AlreadyDecided);
    }

    #[test]
    fn local_test_failure_short_circuits() {
        let mut gate = GateController::new(16);
        gate.record_build(&StageOutcome::passed("build"))
            .expect("in order");
        let decision = gate
            .record_local_tests(&StageOutcome::failed("local-tests", "3 cases failed"))
            .expect("in order")
            .expect("failure decides")
            .clone();
        assert_eq!(decision.outcome, GateOutcome::Halt);
        assert_eq!(decision.reason, "local test failure");
    }

    #[test]
    fn failing_report_halts_with_summary_detail() {
        let mut gate = GateController::new(16);
        gate.record_build(&StageOutcome::passed("build"))
            .expect("in order");
        gate.record_local_tests(&StageOutcome::passed("local-tests"))
            .expect("in order");
        let decision = gate
            .record_equivalence(&report(false))
            .expect("in order")
            .clone();
        assert_eq!(decision.outcome, GateOutcome::Halt);
        assert_eq!(decision.reason, "equivalence-failure");
        match decision.detail {
            Some(GateDetail::Equivalence { summary }) => {
                assert!(!summary.all_passed);
                assert_eq!(summary.failed_cases, 1);
                assert!((summary.max_absolute_error - 0.01).abs() < 1e-12);
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn out_of_order_stage_is_rejected() {
        let mut gate = GateController::new(16);
        let err = gate
            .record_local_tests(&StageOutcome::passed("local-tests"))
            .expect_err("tests before build");
        assert!(matches!(err, GateError::InvalidStage { .. }));

        let err = gate
            .record_equivalence(&report(true))
            .expect_err("equivalence before build");
        assert!(matches!(err, GateError::InvalidStage { .. }));
    }

    #[test]
    fn decision_is_terminal_for_every_stage_feed() {
        let mut gate = GateController::new(16);
        gate.record_build(&StageOutcome::failed("build", "ld error"))
            .expect("in order");

        assert_eq!(
            gate.record_build(&StageOutcome::passed("build")),
            Err(GateError::AlreadyDecided)
        );
        assert_eq!(
            gate.record_local_tests(&StageOutcome::passed("local-tests")),
            Err(GateError::AlreadyDecided)
        );
    }

    #[test]
    fn ledger_records_transitions_and_decision() {
        let mut gate = GateController::new(16);
        gate.record_build(&StageOutcome::passed("build"))
            .expect("in order");
        gate.record_local_tests(&StageOutcome::passed("local-tests"))
            .expect("in order");
        gate.record_equivalence(&report(true)).expect("in order");

        assert_eq!(gate.ledger().len(), 3);
        let latest = gate.ledger().latest().expect("ledger non-empty");
        assert_eq!(latest.outcome, Some(GateOutcome::Proceed));
    }

    #[test]
    fn decision_serializes_snake_case() {
        let mut gate = GateController::new(4);
        let decision = gate
            .record_build(&StageOutcome::failed("build", "broken"))
            .expect("in order")
            .expect("decided")
            .clone();
        let json = serde_json::to_value(&decision).expect("serialize");
        assert_eq!(json["outcome"], "halt");
        assert_eq!(json["detail"]["kind"], "upstream_failure");
    }
}
