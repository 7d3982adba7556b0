#![forbid(unsafe_code)]

//! Execution adapters for the verigate pipeline.
//!
//! An [`Evaluator`] wraps one callable implementation (reference or
//! candidate) behind a uniform, deterministic interface. The case
//! runner in [`runner`] invokes evaluators once per test case and
//! produces immutable [`ObservedOutput`] records for the equivalence
//! engine.
//!
//! Determinism is a contract, not a hope: evaluators take `&self`, so an
//! implementation without interior mutability cannot smuggle state
//! between invocations.

pub mod runner;

pub use runner::{run_case, run_suite, ExecutionError, RunOptions};
// Re-exported so evaluator implementors depend on one crate.
pub use vg_vectors::{FieldMap, FieldValue};

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side of the comparison an adapter speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationTag {
    Reference,
    Candidate,
}

/// The outputs one implementation produced for one test case.
///
/// Produced exactly once per (case, implementation) pair and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedOutput {
    pub case_name: String,
    pub source: ImplementationTag,
    pub adapter_id: String,
    pub fields: FieldMap,
}

/// Failure of a single adapter invocation.
///
/// Underlying implementation failures are wrapped here rather than
/// propagated in implementation-specific form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("missing input field `{field}`")]
    MissingInput { field: String },
    #[error("input field `{field}` has wrong shape: {detail}")]
    InputShape { field: String, detail: String },
    #[error("evaluation did not finish within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("implementation failure: {detail}")]
    Failed { detail: String },
}

/// Uniform capability over an implementation under comparison.
pub trait Evaluator {
    /// Stable identifier used to tag observed outputs and error context.
    fn id(&self) -> &str;

    /// Which side this adapter represents.
    fn tag(&self) -> ImplementationTag;

    /// Evaluate one case's inputs. Identical inputs must always produce
    /// identical outputs: no hidden state, wall clock, or randomness.
    fn evaluate(&self, inputs: &FieldMap) -> Result<FieldMap, EvaluationError>;
}

/// Wraps an evaluator with a bounded invocation timeout.
///
/// The inner evaluation runs on a worker thread; if it does not return
/// within the deadline the invocation fails with
/// [`EvaluationError::Timeout`] instead of hanging the pipeline. A
/// worker that later finishes sends into a disconnected channel, which
/// is harmless.
#[derive(Debug, Clone)]
pub struct TimedEvaluator<E> {
    inner: Arc<E>,
    timeout: Duration,
}

impl<E> TimedEvaluator<E> {
    #[must_use]
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<E> Evaluator for TimedEvaluator<E>
where
    E: Evaluator + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn tag(&self) -> ImplementationTag {
        self.inner.tag()
    }

    fn evaluate(&self, inputs: &FieldMap) -> Result<FieldMap, EvaluationError> {
        let (sender, receiver) = mpsc::channel();
        let worker_inputs = inputs.clone();
        let worker_inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let result = worker_inner.evaluate(&worker_inputs);
            let _ = sender.send(result);
        });

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => Err(EvaluationError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Pull a fixed-length vector input out of a field map.
///
/// Shared helper for payload adapters; produces the structured
/// [`EvaluationError`] variants instead of implementation-specific
/// failures.
pub fn require_vector(
    inputs: &FieldMap,
    field: &str,
    expected_len: usize,
) -> Result<Vec<f64>, EvaluationError> {
    match inputs.get(field) {
        None => Err(EvaluationError::MissingInput {
            field: field.to_owned(),
        }),
        Some(value) => {
            let elements = value.elements();
            if elements.len() != expected_len {
                return Err(EvaluationError::InputShape {
                    field: field.to_owned(),
                    detail: format!("expected length {expected_len}, found {}", elements.len()),
                });
            }
            Ok(elements.to_vec())
        }
    }
}

/// Pull a scalar input out of a field map.
pub fn require_scalar(inputs: &FieldMap, field: &str) -> Result<f64, EvaluationError> {
    match inputs.get(field) {
        None => Err(EvaluationError::MissingInput {
            field: field.to_owned(),
        }),
        Some(vg_vectors::FieldValue::Scalar(value)) => Ok(*value),
        Some(other) => Err(EvaluationError::InputShape {
            field: field.to_owned(),
            detail: format!("expected a scalar, found a vector of length {}", other.len()),
        }),
    }
}
