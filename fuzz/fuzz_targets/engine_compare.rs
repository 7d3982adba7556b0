#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vg_adapters::{ImplementationTag, ObservedOutput};
use vg_engine::compare;
use vg_runtime::{PipelineDefaults, TolerancePolicy};
use vg_vectors::{FieldMap, FieldValue, Suite, TestCase, ToleranceSpec};

#[derive(Debug, Arbitrary)]
struct FuzzComparison {
    case_count: u8,
    width: u8,
    reference_values: Vec<f64>,
    candidate_values: Vec<f64>,
    drop_candidate: bool,
    atol: f64,
    rtol: Option<f64>,
    either_policy: bool,
}

fn observation(
    case: usize,
    side: ImplementationTag,
    width: usize,
    values: &[f64],
) -> ObservedOutput {
    let elements: Vec<f64> = (0..width)
        .map(|i| values.get(case * width + i).copied().unwrap_or(0.0))
        .collect();
    ObservedOutput {
        case_name: format!("case_{case}"),
        source: side,
        adapter_id: String::from("fuzz"),
        fields: FieldMap::from([(String::from("out"), FieldValue::Vector(elements))]),
    }
}

fuzz_target!(|input: FuzzComparison| {
    let case_count = usize::from(input.case_count % 8) + 1;
    let width = usize::from(input.width % 4) + 1;

    let test_cases: Vec<TestCase> = (0..case_count)
        .map(|i| TestCase {
            name: format!("case_{i}"),
            description: String::new(),
            inputs: FieldMap::new(),
            expected_output: FieldMap::from([(
                String::from("out"),
                FieldValue::Vector(vec![0.0; width]),
            )]),
            tolerance: None,
        })
        .collect();

    let Ok(suite) = (Suite {
        algorithm: String::from("fuzz_compare"),
        global_tolerance: Some(ToleranceSpec {
            absolute: input.atol.abs(),
            relative: input.rtol.map(f64::abs),
        }),
        test_cases,
    })
    .validate() else {
        return;
    };

    let reference: Vec<ObservedOutput> = (0..case_count)
        .map(|i| observation(i, ImplementationTag::Reference, width, &input.reference_values))
        .collect();
    let mut candidate: Vec<ObservedOutput> = (0..case_count)
        .map(|i| observation(i, ImplementationTag::Candidate, width, &input.candidate_values))
        .collect();
    if input.drop_candidate {
        candidate.pop();
    }

    let defaults = PipelineDefaults::default().with_policy(if input.either_policy {
        TolerancePolicy::EitherSufficient
    } else {
        TolerancePolicy::RequireBoth
    });

    // Comparison may pass, fail, or report a pairing error, but must
    // never panic, and counts must always be conserved.
    if let Ok(report) = compare(&reference, &candidate, &suite, &defaults) {
        assert_eq!(report.total_cases, case_count);
        assert_eq!(report.passed_cases + report.failed_cases, report.total_cases);
    }
});
