#![forbid(unsafe_code)]

//! Equivalence engine: the decision core of the verigate pipeline.
//!
//! [`compare`] pairs reference and candidate observed outputs by case
//! name, measures per-field absolute and relative error under the
//! resolved tolerance, classifies each case pass/fail, and aggregates
//! everything into an immutable [`EquivalenceReport`], the artifact the
//! gate controller decides on.
//!
//! The comparison is numerically symmetric but directional in intent:
//! it reports how far the candidate deviates from the reference. The
//! engine does no I/O; persistence is a collaborator's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vg_adapters::{ImplementationTag, ObservedOutput};
use vg_runtime::{now_unix_ms, PipelineDefaults, TolerancePolicy};
use vg_vectors::{FieldValue, TestCase, ToleranceSpec, ValidatedSuite};

use std::collections::BTreeMap;

/// Error magnitudes observed for one output field of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldErrors {
    pub field: String,
    /// Maximum elementwise |reference − candidate| for this field.
    pub max_absolute: f64,
    /// Maximum elementwise relative error over the elements whose
    /// reference magnitude exceeded the configured epsilon. `None` when
    /// no element qualified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_relative: Option<f64>,
}

/// Pass/fail verdict and error detail for one test case. Derived once,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub case_name: String,
    pub passed: bool,
    /// Worst absolute error across every field of the case.
    pub max_absolute_error: f64,
    pub tolerance_used: ToleranceSpec,
    pub field_errors: Vec<FieldErrors>,
    pub message: String,
}

/// Aggregate gating artifact for one comparison run.
///
/// Case order mirrors suite declaration order so reports are
/// byte-for-byte reproducible given the same numeric results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceReport {
    pub algorithm: String,
    pub tolerance_policy: TolerancePolicy,
    pub all_passed: bool,
    pub total_cases: usize,
    pub passed_cases: usize,
    pub failed_cases: usize,
    /// Maximum absolute error over all fields across all cases.
    pub max_absolute_error: f64,
    /// Maximum relative error over all qualified elements; 0.0 when no
    /// element qualified for relative-error computation.
    pub max_relative_error: f64,
    pub case_results: Vec<ComparisonResult>,
    pub generated_unix_ms: u128,
}

/// Mismatched case sets between the reference and candidate runs.
///
/// This is an upstream execution bug, not a numeric disagreement: it is
/// always fatal, always surfaced, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PairingError {
    #[error("candidate run is missing case `{case}` present in the reference run")]
    MissingCandidate { case: String },
    #[error("reference run is missing case `{case}` present in the candidate run")]
    MissingReference { case: String },
    #[error("neither run observed suite case `{case}`")]
    MissingObservation { case: String },
    #[error("{side:?} run observed case `{case}` more than once")]
    DuplicateObservation {
        side: ImplementationTag,
        case: String,
    },
    #[error("observed case `{case}` does not exist in suite `{algorithm}`")]
    UnknownCase { case: String, algorithm: String },
}

/// Compare two observed-output sets field by field under the suite's
/// tolerance rules.
pub fn compare(
    reference: &[ObservedOutput],
    candidate: &[ObservedOutput],
    suite: &ValidatedSuite,
    defaults: &PipelineDefaults,
) -> Result<EquivalenceReport, PairingError> {
    let reference_by_case = index_by_case(reference, ImplementationTag::Reference)?;
    let candidate_by_case = index_by_case(candidate, ImplementationTag::Candidate)?;
    check_pairing(suite, &reference_by_case, &candidate_by_case)?;

    let mut case_results = Vec::with_capacity(suite.cases().len());
    let mut max_absolute_error = 0.0_f64;
    let mut max_relative_error = 0.0_f64;

    for case in suite.cases() {
        let tolerance = suite.resolve_tolerance(case, defaults);
        let result = compare_case(
            case,
            reference_by_case[case.name.as_str()],
            candidate_by_case[case.name.as_str()],
            tolerance,
            defaults,
        );

        max_absolute_error = max_absolute_error.max(result.max_absolute_error);
        for field in &result.field_errors {
            if let Some(relative) = field.max_relative {
                max_relative_error = max_relative_error.max(relative);
            }
        }
        case_results.push(result);
    }

    let passed_cases = case_results.iter().filter(|r| r.passed).count();
    let total_cases = case_results.len();
    Ok(EquivalenceReport {
        algorithm: suite.algorithm().to_owned(),
        tolerance_policy: defaults.policy,
        all_passed: passed_cases == total_cases,
        total_cases,
        passed_cases,
        failed_cases: total_cases.saturating_sub(passed_cases),
        max_absolute_error,
        max_relative_error,
        case_results,
        generated_unix_ms: now_unix_ms(),
    })
}

fn index_by_case<'a>(
    outputs: &'a [ObservedOutput],
    side: ImplementationTag,
) -> Result<BTreeMap<&'a str, &'a ObservedOutput>, PairingError> {
    let mut by_case = BTreeMap::new();
    for output in outputs {
        if by_case.insert(output.case_name.as_str(), output).is_some() {
            return Err(PairingError::DuplicateObservation {
                side,
                case: output.case_name.clone(),
            });
        }
    }
    Ok(by_case)
}

fn check_pairing(
    suite: &ValidatedSuite,
    reference: &BTreeMap<&str, &ObservedOutput>,
    candidate: &BTreeMap<&str, &ObservedOutput>,
) -> Result<(), PairingError> {
    for case_name in reference.keys() {
        if !candidate.contains_key(case_name) {
            return Err(PairingError::MissingCandidate {
                case: (*case_name).to_owned(),
            });
        }
    }
    for case_name in candidate.keys() {
        if !reference.contains_key(case_name) {
            return Err(PairingError::MissingReference {
                case: (*case_name).to_owned(),
            });
        }
    }

    let mut known = std::collections::BTreeSet::new();
    for case in suite.cases() {
        known.insert(case.name.as_str());
        if !reference.contains_key(case.name.as_str()) {
            return Err(PairingError::MissingObservation {
                case: case.name.clone(),
            });
        }
    }
    for case_name in reference.keys() {
        if !known.contains(case_name) {
            return Err(PairingError::UnknownCase {
                case: (*case_name).to_owned(),
                algorithm: suite.algorithm().to_owned(),
            });
        }
    }
    Ok(())
}

fn compare_case(
    case: &TestCase,
    reference: &ObservedOutput,
    candidate: &ObservedOutput,
    tolerance: ToleranceSpec,
    defaults: &PipelineDefaults,
) -> ComparisonResult {
    let mut field_errors = Vec::with_capacity(case.expected_output.len());
    let mut case_max_absolute = 0.0_f64;
    let mut case_max_relative: Option<f64> = None;
    let mut qualified_elements = 0_usize;
    let mut structural_failure: Option<String> = None;

    for (field, declared) in &case.expected_output {
        let (reference_value, candidate_value) = match (
            reference.fields.get(field),
            candidate.fields.get(field),
        ) {
            (Some(r), Some(c)) => (r, c),
            (missing_ref, missing_cand) => {
                let side = if missing_ref.is_none() {
                    "reference"
                } else if missing_cand.is_none() {
                    "candidate"
                } else {
                    unreachable!("at least one side is missing in this arm")
                };
                structural_failure.get_or_insert(format!(
                    "{side} output is missing field `{field}`"
                ));
                field_errors.push(FieldErrors {
                    field: field.clone(),
                    max_absolute: f64::INFINITY,
                    max_relative: None,
                });
                case_max_absolute = f64::INFINITY;
                continue;
            }
        };

        if !reference_value.shape_matches(declared) || !candidate_value.shape_matches(declared) {
            structural_failure.get_or_insert(format!(
                "field `{field}` shape does not match the declared expected-output shape"
            ));
            field_errors.push(FieldErrors {
                field: field.clone(),
                max_absolute: f64::INFINITY,
                max_relative: None,
            });
            case_max_absolute = f64::INFINITY;
            continue;
        }

        let errors = field_error(
            field,
            reference_value,
            candidate_value,
            defaults.relative_epsilon,
        );
        case_max_absolute = case_max_absolute.max(errors.errors.max_absolute);
        if let Some(relative) = errors.errors.max_relative {
            case_max_relative = Some(case_max_relative.map_or(relative, |m| m.max(relative)));
        }
        qualified_elements += errors.qualified_elements;
        field_errors.push(errors.errors);
    }

    if let Some(detail) = structural_failure {
        return ComparisonResult {
            case_name: case.name.clone(),
            passed: false,
            max_absolute_error: case_max_absolute,
            tolerance_used: tolerance,
            field_errors,
            message: detail,
        };
    }

    let absolute_ok = case_max_absolute <= tolerance.absolute;
    let relative_ok = match (tolerance.relative, case_max_relative) {
        (None, _) => true,
        // No element qualified: the relative constraint is vacuous.
        (Some(_), None) => true,
        (Some(bound), Some(observed)) => observed <= bound,
    };

    let passed = match (tolerance.relative, defaults.policy) {
        (None, _) => absolute_ok,
        (Some(_), TolerancePolicy::RequireBoth) => absolute_ok && relative_ok,
        // A vacuous relative constraint must not rescue a failed
        // absolute bound under the disjunctive policy.
        (Some(_), TolerancePolicy::EitherSufficient) => {
            absolute_ok || (qualified_elements > 0 && relative_ok)
        }
    };

    let message = if passed {
        format!("case matched (max_abs={case_max_absolute:.2e})")
    } else {
        let worst = field_errors
            .iter()
            .max_by(|a, b| a.max_absolute.total_cmp(&b.max_absolute))
            .map_or("<none>", |f| f.field.as_str());
        format!(
            "tolerance exceeded: max_abs={case_max_absolute:.2e} (worst field `{worst}`, atol={}, rtol={:?})",
            tolerance.absolute, tolerance.relative
        )
    };

    ComparisonResult {
        case_name: case.name.clone(),
        passed,
        max_absolute_error: case_max_absolute,
        tolerance_used: tolerance,
        field_errors,
        message,
    }
}

struct FieldErrorOutcome {
    errors: FieldErrors,
    qualified_elements: usize,
}

/// Elementwise error for one field; relative error is computed only
/// where the reference magnitude exceeds `relative_epsilon`.
fn field_error(
    field: &str,
    reference: &FieldValue,
    candidate: &FieldValue,
    relative_epsilon: f64,
) -> FieldErrorOutcome {
    let mut max_absolute = 0.0_f64;
    let mut max_relative: Option<f64> = None;
    let mut qualified_elements = 0_usize;

    for (reference_element, candidate_element) in
        reference.elements().iter().zip(candidate.elements())
    {
        let absolute = (reference_element - candidate_element).abs();
        max_absolute = max_absolute.max(absolute);

        if reference_element.abs() > relative_epsilon {
            let relative = absolute / reference_element.abs();
            max_relative = Some(max_relative.map_or(relative, |m| m.max(relative)));
            qualified_elements += 1;
        }
    }

    FieldErrorOutcome {
        errors: FieldErrors {
            field: field.to_owned(),
            max_absolute,
            max_relative,
        },
        qualified_elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_vectors::{FieldMap, Suite};

    fn estimator_case(name: &str, state: [f64; 2], tolerance: Option<ToleranceSpec>) -> TestCase {
        TestCase {
            name: name.to_owned(),
            description: String::new(),
            inputs: FieldMap::from([("state".to_owned(), FieldValue::Vector(state.to_vec()))]),
            expected_output: FieldMap::from([
                (
                    "updated_state".to_owned(),
                    FieldValue::Vector(state.to_vec()),
                ),
                ("innovation".to_owned(), FieldValue::Scalar(0.0)),
            ]),
            tolerance,
        }
    }

    fn validated_suite(cases: Vec<TestCase>) -> ValidatedSuite {
        Suite {
            algorithm: "two_state_estimator".to_owned(),
            global_tolerance: Some(ToleranceSpec::absolute(1e-10)),
            test_cases: cases,
        }
        .validate()
        .expect("valid suite")
    }

    fn observed(
        case: &str,
        side: ImplementationTag,
        state: [f64; 2],
        innovation: f64,
    ) -> ObservedOutput {
        ObservedOutput {
            case_name: case.to_owned(),
            source: side,
            adapter_id: match side {
                ImplementationTag::Reference => "ref".to_owned(),
                ImplementationTag::Candidate => "cand".to_owned(),
            },
            fields: FieldMap::from([
                (
                    "updated_state".to_owned(),
                    FieldValue::Vector(state.to_vec()),
                ),
                ("innovation".to_owned(), FieldValue::Scalar(innovation)),
            ]),
        }
    }

    fn defaults() -> PipelineDefaults {
        PipelineDefaults::default()
    }

    #[test]
    fn identical_outputs_pass_with_zero_error() {
        let suite = validated_suite(vec![
            estimator_case("nominal", [1.0, 0.0], None),
            estimator_case("drift", [0.5, -0.25], None),
        ]);
        let reference = vec![
            observed("nominal", ImplementationTag::Reference, [1.0, 0.0], 0.0),
            observed("drift", ImplementationTag::Reference, [0.5, -0.25], 0.0),
        ];
        let candidate = vec![
            observed("nominal", ImplementationTag::Candidate, [1.0, 0.0], 0.0),
            observed("drift", ImplementationTag::Candidate, [0.5, -0.25], 0.0),
        ];

        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");
        assert!(report.all_passed);
        assert_eq!(report.total_cases, 2);
        assert_eq!(report.passed_cases, 2);
        assert_eq!(report.failed_cases, 0);
        assert_eq!(report.max_absolute_error, 0.0);
        assert_eq!(report.max_relative_error, 0.0);
    }

    #[test]
    fn single_field_excess_fails_only_that_case() {
        let suite = validated_suite(vec![
            estimator_case("nominal", [1.0, 0.0], None),
            estimator_case("diverged", [1.0, 0.0], None),
        ]);
        let reference = vec![
            observed("nominal", ImplementationTag::Reference, [1.0, 0.0], 0.0),
            observed("diverged", ImplementationTag::Reference, [1.0, 0.0], 0.0),
        ];
        let candidate = vec![
            observed("nominal", ImplementationTag::Candidate, [1.0, 0.0], 0.0),
            observed("diverged", ImplementationTag::Candidate, [1.01, 0.0], 0.0),
        ];

        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");
        assert!(!report.all_passed);
        assert_eq!(report.passed_cases, 1);
        assert_eq!(report.failed_cases, 1);
        assert!((report.max_absolute_error - 0.01).abs() < 1e-12);

        let nominal = &report.case_results[0];
        assert!(nominal.passed, "untouched case must still pass");
        let diverged = &report.case_results[1];
        assert!(!diverged.passed);
        assert!(diverged.message.contains("updated_state"));
    }

    #[test]
    fn report_order_mirrors_suite_order_not_input_order() {
        let suite = validated_suite(vec![
            estimator_case("zulu", [1.0, 0.0], None),
            estimator_case("alpha", [2.0, 0.0], None),
        ]);
        // Observed outputs deliberately delivered in reverse.
        let reference = vec![
            observed("alpha", ImplementationTag::Reference, [2.0, 0.0], 0.0),
            observed("zulu", ImplementationTag::Reference, [1.0, 0.0], 0.0),
        ];
        let candidate = vec![
            observed("alpha", ImplementationTag::Candidate, [2.0, 0.0], 0.0),
            observed("zulu", ImplementationTag::Candidate, [1.0, 0.0], 0.0),
        ];

        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");
        let order: Vec<&str> = report
            .case_results
            .iter()
            .map(|r| r.case_name.as_str())
            .collect();
        assert_eq!(order, vec!["zulu", "alpha"]);
    }

    #[test]
    fn relative_error_excluded_below_epsilon() {
        let suite = validated_suite(vec![estimator_case("near_zero", [0.0, 0.0], None)]);
        // Reference magnitudes are ~1e-16, below the 1e-15 epsilon: the
        // absolute difference is tiny but the quotient would be huge.
        let reference = vec![observed(
            "near_zero",
            ImplementationTag::Reference,
            [1e-16, 0.0],
            0.0,
        )];
        let candidate = vec![observed(
            "near_zero",
            ImplementationTag::Candidate,
            [2e-16, 0.0],
            0.0,
        )];

        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");
        assert!(report.all_passed);
        assert_eq!(report.max_relative_error, 0.0);
        let errors = &report.case_results[0].field_errors;
        let state_errors = errors
            .iter()
            .find(|f| f.field == "updated_state")
            .expect("state field present");
        assert!(state_errors.max_relative.is_none());
    }

    #[test]
    fn pairing_error_when_candidate_omits_case() {
        let suite = validated_suite(vec![
            estimator_case("a", [1.0, 0.0], None),
            estimator_case("b", [2.0, 0.0], None),
        ]);
        let reference = vec![
            observed("a", ImplementationTag::Reference, [1.0, 0.0], 0.0),
            observed("b", ImplementationTag::Reference, [2.0, 0.0], 0.0),
        ];
        let candidate = vec![observed("a", ImplementationTag::Candidate, [1.0, 0.0], 0.0)];

        let err = compare(&reference, &candidate, &suite, &defaults()).expect_err("must fail");
        match err {
            PairingError::MissingCandidate { case } => assert_eq!(case, "b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pairing_error_when_reference_omits_case() {
        let suite = validated_suite(vec![
            estimator_case("a", [1.0, 0.0], None),
            estimator_case("b", [2.0, 0.0], None),
        ]);
        let reference = vec![observed("b", ImplementationTag::Reference, [2.0, 0.0], 0.0)];
        let candidate = vec![
            observed("a", ImplementationTag::Candidate, [1.0, 0.0], 0.0),
            observed("b", ImplementationTag::Candidate, [2.0, 0.0], 0.0),
        ];

        let err = compare(&reference, &candidate, &suite, &defaults()).expect_err("must fail");
        match err {
            PairingError::MissingReference { case } => assert_eq!(case, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pairing_error_on_duplicate_observation() {
        let suite = validated_suite(vec![estimator_case("a", [1.0, 0.0], None)]);
        let reference = vec![
            observed("a", ImplementationTag::Reference, [1.0, 0.0], 0.0),
            observed("a", ImplementationTag::Reference, [1.0, 0.0], 0.0),
        ];
        let candidate = vec![observed("a", ImplementationTag::Candidate, [1.0, 0.0], 0.0)];

        let err = compare(&reference, &candidate, &suite, &defaults()).expect_err("must fail");
        assert!(matches!(err, PairingError::DuplicateObservation { .. }));
    }

    #[test]
    fn pairing_error_on_unknown_case() {
        let suite = validated_suite(vec![estimator_case("a", [1.0, 0.0], None)]);
        let reference = vec![
            observed("a", ImplementationTag::Reference, [1.0, 0.0], 0.0),
            observed("ghost", ImplementationTag::Reference, [9.0, 9.0], 0.0),
        ];
        let candidate = vec![
            observed("a", ImplementationTag::Candidate, [1.0, 0.0], 0.0),
            observed("ghost", ImplementationTag::Candidate, [9.0, 9.0], 0.0),
        ];

        let err = compare(&reference, &candidate, &suite, &defaults()).expect_err("must fail");
        match err {
            PairingError::UnknownCase { case, .. } => assert_eq!(case, "ghost"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn per_case_tolerance_override_takes_precedence() {
        let loose = ToleranceSpec::absolute(0.1);
        let suite = validated_suite(vec![estimator_case("loose", [1.0, 0.0], Some(loose))]);
        let reference = vec![observed("loose", ImplementationTag::Reference, [1.0, 0.0], 0.0)];
        let candidate = vec![observed(
            "loose",
            ImplementationTag::Candidate,
            [1.01, 0.0],
            0.0,
        )];

        // 0.01 exceeds the 1e-10 suite global but sits inside the 0.1
        // per-case override.
        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");
        assert!(report.all_passed);
        assert_eq!(report.case_results[0].tolerance_used, loose);
    }

    #[test]
    fn system_default_used_when_suite_has_no_tolerance() {
        let suite = Suite {
            algorithm: "two_state_estimator".to_owned(),
            global_tolerance: None,
            test_cases: vec![estimator_case("only", [1.0, 0.0], None)],
        }
        .validate()
        .expect("valid");
        let reference = vec![observed("only", ImplementationTag::Reference, [1.0, 0.0], 0.0)];
        let candidate = vec![observed(
            "only",
            ImplementationTag::Candidate,
            [1.0 + 1e-8, 0.0],
            0.0,
        )];

        let strict = PipelineDefaults::default(); // absolute 1e-10
        let report = compare(&reference, &candidate, &suite, &strict).expect("pairs");
        assert!(!report.all_passed);

        let loose = PipelineDefaults::default().with_absolute_tolerance(1e-6);
        let report = compare(&reference, &candidate, &suite, &loose).expect("pairs");
        assert!(report.all_passed);
        assert_eq!(report.case_results[0].tolerance_used.absolute, 1e-6);
    }

    #[test]
    fn require_both_policy_fails_when_relative_bound_exceeded() {
        let tolerance = ToleranceSpec::absolute(1.0).with_relative(1e-6);
        let suite = validated_suite(vec![estimator_case("dual", [100.0, 0.0], Some(tolerance))]);
        let reference = vec![observed(
            "dual",
            ImplementationTag::Reference,
            [100.0, 0.0],
            0.0,
        )];
        // Absolute error 0.01 is inside atol=1.0 but relative error 1e-4
        // exceeds rtol=1e-6.
        let candidate = vec![observed(
            "dual",
            ImplementationTag::Candidate,
            [100.01, 0.0],
            0.0,
        )];

        let conjunctive = PipelineDefaults::default();
        let report = compare(&reference, &candidate, &suite, &conjunctive).expect("pairs");
        assert!(!report.all_passed, "RequireBoth must enforce both bounds");

        let disjunctive =
            PipelineDefaults::default().with_policy(TolerancePolicy::EitherSufficient);
        let report = compare(&reference, &candidate, &suite, &disjunctive).expect("pairs");
        assert!(report.all_passed, "EitherSufficient accepts the absolute bound");
        assert_eq!(report.tolerance_policy, TolerancePolicy::EitherSufficient);
    }

    #[test]
    fn either_policy_does_not_let_vacuous_relative_rescue_failure() {
        let tolerance = ToleranceSpec::absolute(1e-10).with_relative(1e-6);
        let suite = validated_suite(vec![estimator_case("tiny", [0.0, 0.0], Some(tolerance))]);
        // All reference magnitudes below epsilon: no element qualifies
        // for relative error, and the absolute bound is blown.
        let reference = vec![observed("tiny", ImplementationTag::Reference, [0.0, 0.0], 0.0)];
        let candidate = vec![observed(
            "tiny",
            ImplementationTag::Candidate,
            [0.5, 0.0],
            0.0,
        )];

        let disjunctive =
            PipelineDefaults::default().with_policy(TolerancePolicy::EitherSufficient);
        let report = compare(&reference, &candidate, &suite, &disjunctive).expect("pairs");
        assert!(!report.all_passed);
    }

    #[test]
    fn missing_observed_field_is_reported_not_panicked() {
        let suite = validated_suite(vec![estimator_case("partial", [1.0, 0.0], None)]);
        let reference = vec![observed(
            "partial",
            ImplementationTag::Reference,
            [1.0, 0.0],
            0.0,
        )];
        let mut broken = observed("partial", ImplementationTag::Candidate, [1.0, 0.0], 0.0);
        broken.fields.remove("innovation");
        let candidate = vec![broken];

        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");
        assert!(!report.all_passed);
        let result = &report.case_results[0];
        assert!(result.max_absolute_error.is_infinite());
        assert!(result.message.contains("innovation"));
    }

    #[test]
    fn report_serializes_and_round_trips() {
        let suite = validated_suite(vec![estimator_case("nominal", [1.0, 0.0], None)]);
        let reference = vec![observed(
            "nominal",
            ImplementationTag::Reference,
            [1.0, 0.0],
            0.0,
        )];
        let candidate = vec![observed(
            "nominal",
            ImplementationTag::Candidate,
            [1.0, 0.0],
            0.0,
        )];
        let report = compare(&reference, &candidate, &suite, &defaults()).expect("pairs");

        let json = serde_json::to_string_pretty(&report).expect("report serializes");
        let parsed: EquivalenceReport = serde_json::from_str(&json).expect("round-trips");
        assert_eq!(parsed, report);
    }
}
