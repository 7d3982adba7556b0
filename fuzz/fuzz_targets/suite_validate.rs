#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vg_vectors::{FieldMap, FieldValue, Suite, TestCase, ToleranceSpec};

#[derive(Debug, Arbitrary)]
struct FuzzField {
    name: u8,
    scalar: bool,
    values: Vec<f64>,
}

#[derive(Debug, Arbitrary)]
struct FuzzCase {
    name: u8,
    inputs: Vec<FuzzField>,
    outputs: Vec<FuzzField>,
    tolerance: Option<(f64, Option<f64>)>,
}

#[derive(Debug, Arbitrary)]
struct FuzzSuite {
    global_tolerance: Option<(f64, Option<f64>)>,
    cases: Vec<FuzzCase>,
}

fn build_field(field: &FuzzField) -> (String, FieldValue) {
    let clipped: Vec<f64> = field.values.iter().copied().take(8).collect();
    let value = if field.scalar {
        FieldValue::Scalar(clipped.first().copied().unwrap_or(0.0))
    } else {
        FieldValue::Vector(clipped)
    };
    (format!("field_{}", field.name % 16), value)
}

fn build_tolerance(raw: (f64, Option<f64>)) -> ToleranceSpec {
    ToleranceSpec {
        absolute: raw.0,
        relative: raw.1,
    }
}

fuzz_target!(|input: FuzzSuite| {
    let test_cases: Vec<TestCase> = input
        .cases
        .iter()
        .take(32)
        .map(|case| TestCase {
            name: format!("case_{}", case.name),
            description: String::new(),
            inputs: case.inputs.iter().take(8).map(build_field).collect::<FieldMap>(),
            expected_output: case
                .outputs
                .iter()
                .take(8)
                .map(build_field)
                .collect::<FieldMap>(),
            tolerance: case.tolerance.map(build_tolerance),
        })
        .collect();

    let suite = Suite {
        algorithm: String::from("fuzz_suite"),
        global_tolerance: input.global_tolerance.map(build_tolerance),
        test_cases,
    };

    // Validation may accept or reject, but must never panic.
    let _ = suite.validate();
});
