//! Schema validation of the bundled fixtures, and a ground-truth check
//! that the nominal fixture's expected outputs are exactly what the
//! reference implementation produces.

use vg_adapters::Evaluator;
use vg_conformance::HarnessConfig;
use vg_estimator::ReferenceEstimator;
use vg_vectors::{FieldValue, Suite, ToleranceSpec, VectorStoreError};

#[test]
fn bundled_fixture_validates() {
    let config = HarnessConfig::default_paths();
    let suite = Suite::from_path(&config.fixture_root.join("two_state_estimator.json"))
        .expect("fixture parses")
        .validate()
        .expect("fixture validates");

    assert_eq!(suite.algorithm(), "two_state_estimator");
    assert_eq!(suite.cases().len(), 5);
    assert_eq!(suite.global_tolerance(), Some(ToleranceSpec::absolute(1e-10)));

    let names: Vec<&str> = suite.cases().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "nominal",
            "constant_velocity_track",
            "stationary_drift",
            "high_uncertainty_initial",
            "measurement_snap"
        ]
    );

    let snap = suite
        .cases()
        .iter()
        .find(|c| c.name == "measurement_snap")
        .expect("override case present");
    assert_eq!(
        snap.tolerance,
        Some(ToleranceSpec::absolute(1e-9).with_relative(1e-6))
    );
}

#[test]
fn bundled_fixture_expectations_match_the_reference_implementation() {
    // Every fixture case was chosen so each intermediate is a dyadic
    // rational: the reference step must reproduce the expected outputs
    // bit for bit, not merely within tolerance.
    let config = HarnessConfig::default_paths();
    let suite = Suite::from_path(&config.fixture_root.join("two_state_estimator.json"))
        .expect("fixture parses")
        .validate()
        .expect("fixture validates");

    for case in suite.cases() {
        let observed = ReferenceEstimator
            .evaluate(&case.inputs)
            .expect("reference evaluates fixture inputs");
        for (field, expected) in &case.expected_output {
            let actual = observed.get(field).expect("declared field produced");
            assert_eq!(
                actual, expected,
                "case `{}` field `{field}` must match exactly",
                case.name
            );
        }
    }
}

#[test]
fn duplicate_case_fixture_is_rejected() {
    let config = HarnessConfig::default_paths();
    let err = Suite::from_path(&config.fixture_root.join("duplicate_case_name.json"))
        .expect("fixture parses")
        .validate()
        .expect_err("duplicate names must fail validation");
    match err {
        VectorStoreError::DuplicateCaseName { name, .. } => assert_eq!(name, "nominal"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_mismatch_fixture_is_rejected() {
    let config = HarnessConfig::default_paths();
    let err = Suite::from_path(&config.fixture_root.join("schema_mismatch.json"))
        .expect("fixture parses")
        .validate()
        .expect_err("schema drift must fail validation");
    match err {
        VectorStoreError::SchemaMismatch { case, .. } => assert_eq!(case, "narrower_output"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fixture_fields_have_the_documented_shapes() {
    let config = HarnessConfig::default_paths();
    let suite = Suite::from_path(&config.fixture_root.join("two_state_estimator.json"))
        .expect("fixture parses")
        .validate()
        .expect("fixture validates");

    for case in suite.cases() {
        assert!(matches!(
            case.inputs.get("state"),
            Some(FieldValue::Vector(v)) if v.len() == 2
        ));
        assert!(matches!(
            case.inputs.get("state_covariance"),
            Some(FieldValue::Vector(v)) if v.len() == 4
        ));
        assert!(matches!(
            case.inputs.get("measurement"),
            Some(FieldValue::Scalar(_))
        ));
        assert!(matches!(
            case.expected_output.get("updated_state"),
            Some(FieldValue::Vector(v)) if v.len() == 2
        ));
        assert!(matches!(
            case.expected_output.get("updated_covariance"),
            Some(FieldValue::Vector(v)) if v.len() == 4
        ));
    }
}
