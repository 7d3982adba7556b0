#![forbid(unsafe_code)]

//! One-shot suite validation.
//!
//! All structural checks happen here, at load time: the case runners and
//! the equivalence engine operate on a [`ValidatedSuite`] and never
//! re-derive schema facts ad hoc.

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vg_runtime::PipelineDefaults;

use crate::model::{Suite, TestCase, ToleranceSpec};

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed reading test vectors at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("test vector document at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("suite `{algorithm}` contains no test cases")]
    EmptySuite { algorithm: String },
    #[error("duplicate test case name `{name}` in suite `{algorithm}`")]
    DuplicateCaseName { algorithm: String, name: String },
    #[error("test case `{case}` field `{field}` contains a non-finite value")]
    MalformedVector { case: String, field: String },
    #[error("test case `{case}` expected-output schema mismatch: {detail}")]
    SchemaMismatch { case: String, detail: String },
    #[error("test case `{case}` tolerance is malformed: bounds must be finite and non-negative")]
    MalformedTolerance { case: String },
    #[error("suite `{algorithm}` global tolerance is malformed: bounds must be finite and non-negative")]
    MalformedGlobalTolerance { algorithm: String },
}

/// A suite that has passed structural validation.
///
/// The wrapper is the only way to hand a suite to the runner or the
/// engine, so downstream code can rely on: non-empty case list, unique
/// case names, a single expected-output schema shared by every case,
/// finite numerics, and well-formed tolerance bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSuite {
    suite: Suite,
}

impl ValidatedSuite {
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.suite.algorithm
    }

    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.suite.test_cases
    }

    #[must_use]
    pub fn global_tolerance(&self) -> Option<ToleranceSpec> {
        self.suite.global_tolerance
    }

    #[must_use]
    pub fn into_inner(self) -> Suite {
        self.suite
    }

    /// Resolve the effective tolerance for one case:
    /// per-case override → suite global default → system default.
    #[must_use]
    pub fn resolve_tolerance(
        &self,
        case: &TestCase,
        defaults: &PipelineDefaults,
    ) -> ToleranceSpec {
        case.tolerance
            .or(self.suite.global_tolerance)
            .unwrap_or(ToleranceSpec {
                absolute: defaults.absolute_tolerance,
                relative: defaults.relative_tolerance,
            })
    }
}

impl Suite {
    /// Validate this suite, consuming it.
    ///
    /// The expected-output schema is declared by the first case: every
    /// later case must expose the same field names with the same shapes.
    pub fn validate(self) -> Result<ValidatedSuite, VectorStoreError> {
        let algorithm = self.algorithm.clone();

        let Some(first) = self.test_cases.first() else {
            return Err(VectorStoreError::EmptySuite { algorithm });
        };

        if let Some(global) = self.global_tolerance {
            if !global.is_well_formed() {
                return Err(VectorStoreError::MalformedGlobalTolerance { algorithm });
            }
        }

        let schema: Vec<(&String, &crate::model::FieldValue)> =
            first.expected_output.iter().collect();

        let mut seen_names = BTreeSet::new();
        for case in &self.test_cases {
            if !seen_names.insert(case.name.as_str()) {
                return Err(VectorStoreError::DuplicateCaseName {
                    algorithm,
                    name: case.name.clone(),
                });
            }

            for (field, value) in case.inputs.iter().chain(case.expected_output.iter()) {
                if !value.is_finite() {
                    return Err(VectorStoreError::MalformedVector {
                        case: case.name.clone(),
                        field: field.clone(),
                    });
                }
            }

            if let Some(tolerance) = case.tolerance {
                if !tolerance.is_well_formed() {
                    return Err(VectorStoreError::MalformedTolerance {
                        case: case.name.clone(),
                    });
                }
            }

            check_schema(case, &schema)?;
        }

        Ok(ValidatedSuite { suite: self })
    }
}

fn describe_shape(value: &crate::model::FieldValue) -> String {
    match value {
        crate::model::FieldValue::Scalar(_) => String::from("a scalar"),
        crate::model::FieldValue::Vector(values) => format!("a vector of length {}", values.len()),
    }
}

fn check_schema(
    case: &TestCase,
    schema: &[(&String, &crate::model::FieldValue)],
) -> Result<(), VectorStoreError> {
    if case.expected_output.len() != schema.len() {
        return Err(VectorStoreError::SchemaMismatch {
            case: case.name.clone(),
            detail: format!(
                "expected {} output fields, found {}",
                schema.len(),
                case.expected_output.len()
            ),
        });
    }

    for (field, declared) in schema {
        match case.expected_output.get(*field) {
            None => {
                return Err(VectorStoreError::SchemaMismatch {
                    case: case.name.clone(),
                    detail: format!("missing output field `{field}`"),
                });
            }
            Some(value) if !value.shape_matches(declared) => {
                return Err(VectorStoreError::SchemaMismatch {
                    case: case.name.clone(),
                    detail: format!(
                        "output field `{field}` is {}, declared {}",
                        describe_shape(value),
                        describe_shape(declared)
                    ),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}
