#![forbid(unsafe_code)]

//! Case runner: one adapter invocation per test case, independent and
//! order-insensitive.
//!
//! Suite runs may fan cases out across worker threads. Cases share only
//! the read-only suite; every result lands in a per-case slot so output
//! order mirrors suite declaration order regardless of scheduling.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use thiserror::Error;
use vg_vectors::{TestCase, ValidatedSuite};

use crate::{EvaluationError, Evaluator, ObservedOutput};

/// Failure of a case run, carrying case and adapter context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("case `{case}` failed on adapter `{adapter}`: {source}")]
    Evaluation {
        case: String,
        adapter: String,
        source: EvaluationError,
    },
    #[error("suite run cancelled before case `{case}` started")]
    Cancelled { case: String },
}

/// Options for a suite run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of worker threads claiming cases. Clamped to at least 1.
    pub parallelism: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { parallelism: 1 }
    }
}

impl RunOptions {
    #[must_use]
    pub fn parallel(workers: usize) -> Self {
        Self {
            parallelism: workers,
        }
    }
}

/// Run one test case against one adapter.
///
/// Invokes the adapter exactly once; a failure is reported, never
/// retried or masked.
pub fn run_case(
    case: &TestCase,
    evaluator: &dyn Evaluator,
) -> Result<ObservedOutput, ExecutionError> {
    let fields =
        evaluator
            .evaluate(&case.inputs)
            .map_err(|source| ExecutionError::Evaluation {
                case: case.name.clone(),
                adapter: evaluator.id().to_owned(),
                source,
            })?;

    Ok(ObservedOutput {
        case_name: case.name.clone(),
        source: evaluator.tag(),
        adapter_id: evaluator.id().to_owned(),
        fields,
    })
}

/// Run every case in the suite against one adapter.
///
/// Workers claim case indices from a shared counter; there is no other
/// shared mutable state between evaluations. When `cancel` is set,
/// workers stop claiming new cases and the run fails with
/// [`ExecutionError::Cancelled`] naming the first unexecuted case.
/// On any failure the error for the earliest case in suite order is
/// returned, so diagnostics are reproducible across schedules.
pub fn run_suite(
    suite: &ValidatedSuite,
    evaluator: &(dyn Evaluator + Sync),
    options: &RunOptions,
    cancel: &AtomicBool,
) -> Result<Vec<ObservedOutput>, ExecutionError> {
    let cases = suite.cases();
    let workers = options.parallelism.clamp(1, cases.len().max(1));

    let next_case = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<Result<ObservedOutput, ExecutionError>>>> =
        cases.iter().map(|_| Mutex::new(None)).collect();

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                if cancel.load(Ordering::SeqCst) {
                    break;
                }
                let index = next_case.fetch_add(1, Ordering::SeqCst);
                let Some(case) = cases.get(index) else {
                    break;
                };
                let outcome = run_case(case, evaluator);
                if let Ok(mut slot) = slots[index].lock() {
                    *slot = Some(outcome);
                }
            });
        }
    });

    let mut outputs = Vec::with_capacity(cases.len());
    for (case, slot) in cases.iter().zip(slots) {
        let outcome = slot
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match outcome {
            Some(Ok(output)) => outputs.push(output),
            Some(Err(error)) => return Err(error),
            None => {
                return Err(ExecutionError::Cancelled {
                    case: case.name.clone(),
                })
            }
        }
    }
    Ok(outputs)
}
