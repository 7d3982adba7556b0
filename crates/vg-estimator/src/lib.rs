#![forbid(unsafe_code)]

//! Two-state constant-velocity linear estimator: the example payload the
//! verigate pipeline verifies.
//!
//! Two implementations of the same predict/update step exist side by
//! side:
//!
//! - [`reference`]: the authoritative matrix-form implementation.
//! - [`generated`]: the algebraically flattened form a code generator
//!   emits, exploiting the fixed structure of the transition and
//!   measurement matrices.
//!
//! Both use the Joseph-form covariance update. The pipeline core is
//! agnostic to this payload; only the adapters at the bottom of this
//! crate bind it to the vector-store field names.

pub mod generated;
pub mod reference;

use std::collections::BTreeMap;

use vg_adapters::{
    require_scalar, require_vector, EvaluationError, Evaluator, ImplementationTag,
};
use vg_vectors::{FieldMap, FieldValue};

/// Inputs of one predict/update step.
///
/// `state_covariance` is the row-major flattened 2×2 covariance, the
/// layout the vendor test vectors use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorInput {
    pub state: [f64; 2],
    pub measurement: f64,
    pub state_covariance: [f64; 4],
    pub measurement_noise: f64,
    pub process_noise: f64,
}

impl EstimatorInput {
    /// Decode from vector-store fields, with structured shape errors.
    pub fn from_fields(inputs: &FieldMap) -> Result<Self, EvaluationError> {
        let state = require_vector(inputs, "state", 2)?;
        let state_covariance = require_vector(inputs, "state_covariance", 4)?;
        Ok(Self {
            state: [state[0], state[1]],
            measurement: require_scalar(inputs, "measurement")?,
            state_covariance: [
                state_covariance[0],
                state_covariance[1],
                state_covariance[2],
                state_covariance[3],
            ],
            measurement_noise: require_scalar(inputs, "measurement_noise")?,
            process_noise: require_scalar(inputs, "process_noise")?,
        })
    }
}

/// Outputs of one predict/update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOutput {
    pub updated_state: [f64; 2],
    pub updated_covariance: [f64; 4],
}

impl EstimatorOutput {
    /// Encode into vector-store fields.
    #[must_use]
    pub fn into_fields(self) -> FieldMap {
        BTreeMap::from([
            (
                String::from("updated_state"),
                FieldValue::Vector(self.updated_state.to_vec()),
            ),
            (
                String::from("updated_covariance"),
                FieldValue::Vector(self.updated_covariance.to_vec()),
            ),
        ])
    }
}

/// Adapter over the authoritative matrix-form implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEstimator;

impl Evaluator for ReferenceEstimator {
    fn id(&self) -> &str {
        "estimator-reference"
    }

    fn tag(&self) -> ImplementationTag {
        ImplementationTag::Reference
    }

    fn evaluate(&self, inputs: &FieldMap) -> Result<FieldMap, EvaluationError> {
        let input = EstimatorInput::from_fields(inputs)?;
        Ok(reference::step(&input).into_fields())
    }
}

/// Adapter over the generated flattened implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedEstimator;

impl Evaluator for GeneratedEstimator {
    fn id(&self) -> &str {
        "estimator-generated"
    }

    fn tag(&self) -> ImplementationTag {
        ImplementationTag::Candidate
    }

    fn evaluate(&self, inputs: &FieldMap) -> Result<FieldMap, EvaluationError> {
        let input = EstimatorInput::from_fields(inputs)?;
        Ok(generated::step(&input).into_fields())
    }
}
