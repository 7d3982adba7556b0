#![forbid(unsafe_code)]

//! Pipeline harness for verigate.
//!
//! Wires the leaf components into the staged release flow: change
//! detection names the suite, upstream build/test outcomes arrive as
//! black boxes, both implementations run against the shared vectors,
//! the equivalence engine compares, the gate controller decides, and
//! the run bundle (report, checksum sidecar, decision, events) is
//! persisted for the downstream notifier and publisher.
//!
//! The engine itself stays pure; every filesystem side effect lives
//! here.

pub mod events;
pub mod notes;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use blake3::hash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vg_adapters::{
    run_suite, EvaluationError, Evaluator, ExecutionError, FieldMap, ImplementationTag,
    RunOptions,
};
use vg_engine::{compare, EquivalenceReport, PairingError};
use vg_gate::{GateController, GateDecision, GateError, GateOutcome, StageOutcome};
use vg_runtime::{now_unix_ms, PipelineDefaults};
use vg_vectors::{Suite, ValidatedSuite, VectorStoreError};

use events::{collect_environment_snapshot, write_events, EnvironmentSnapshot, PipelineLogEntry};

/// Filesystem layout for a harness invocation.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub fixture_root: PathBuf,
    pub artifact_root: PathBuf,
}

impl HarnessConfig {
    #[must_use]
    pub fn default_paths() -> Self {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        Self {
            fixture_root: manifest.join("fixtures"),
            artifact_root: manifest.join("fixtures/artifacts"),
        }
    }

    #[must_use]
    pub fn run_dir_for(&self, run_id: &str) -> PathBuf {
        self.artifact_root.join(run_id)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::default_paths()
    }
}

/// Everything one pipeline run needs, upstream collaborators included.
pub struct PipelineSpec<'a> {
    /// Algorithm whose suite the change-detection stage selected.
    pub algorithm: String,
    /// Fixture file name under the configured fixture root.
    pub fixture_name: String,
    /// Build stage result, supplied as a black box.
    pub build: StageOutcome,
    /// Local (per-implementation) test stage result.
    pub local_tests: StageOutcome,
    pub reference: &'a (dyn Evaluator + Sync),
    pub candidate: &'a (dyn Evaluator + Sync),
    pub defaults: PipelineDefaults,
    pub run_options: RunOptions,
    /// Explicit run id for reproducible bundles; generated when absent.
    pub run_id: Option<String>,
}

/// Paths of the artifacts one run persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub run_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_path: Option<PathBuf>,
    pub decision_path: PathBuf,
    pub events_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Integrity sidecar for a persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumSidecar {
    pub schema_version: u8,
    pub source_hash: String,
    pub byte_len: usize,
}

/// On-disk summary of one run bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunBundleSummary {
    pub run_id: String,
    pub algorithm: String,
    pub outcome: GateOutcome,
    pub reason: String,
    pub generated_unix_ms: u128,
    pub environment: EnvironmentSnapshot,
}

/// In-memory result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunSummary {
    pub run_id: String,
    pub algorithm: String,
    pub decision: GateDecision,
    pub report: Option<EquivalenceReport>,
    pub artifacts: ArtifactBundle,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Vectors(#[from] VectorStoreError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Pairing(#[from] PairingError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("artifact write failed for {path}: {source}")]
    ArtifactIo { path: PathBuf, source: io::Error },
    #[error("artifact serialization failed: {0}")]
    ArtifactSerialize(#[from] serde_json::Error),
}

/// Run the full staged pipeline.
///
/// Upstream failures short-circuit before any adapter is invoked: the
/// cancel flag is raised and no case runner ever starts, so a broken
/// build never burns evaluation time.
pub fn run_pipeline(
    config: &HarnessConfig,
    spec: &PipelineSpec<'_>,
) -> Result<PipelineRunSummary, HarnessError> {
    let run_id = spec
        .run_id
        .clone()
        .unwrap_or_else(|| format!("run-{}", now_unix_ms()));
    let fixture_path = config.fixture_root.join(&spec.fixture_name);
    let cancel = AtomicBool::new(false);
    let mut events: Vec<PipelineLogEntry> = Vec::new();
    let mut gate = GateController::new(32);

    log_stage(
        &mut events,
        &run_id,
        "change-detection",
        true,
        format!("selected algorithm `{}`", spec.algorithm),
        vec![fixture_path.display().to_string()],
    );

    log_stage(
        &mut events,
        &run_id,
        &spec.build.stage,
        spec.build.success,
        stage_message(&spec.build),
        Vec::new(),
    );
    if let Some(decision) = gate.record_build(&spec.build)? {
        cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        let decision = decision.clone();
        return finish_run(config, spec, run_id, decision, None, events, &fixture_path);
    }

    log_stage(
        &mut events,
        &run_id,
        &spec.local_tests.stage,
        spec.local_tests.success,
        stage_message(&spec.local_tests),
        Vec::new(),
    );
    if let Some(decision) = gate.record_local_tests(&spec.local_tests)? {
        cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        let decision = decision.clone();
        return finish_run(config, spec, run_id, decision, None, events, &fixture_path);
    }

    let suite = Suite::from_path(&fixture_path)?.validate()?;
    log_stage(
        &mut events,
        &run_id,
        "load-vectors",
        true,
        format!("validated {} test cases", suite.cases().len()),
        vec![fixture_path.display().to_string()],
    );

    let reference_outputs = run_suite(&suite, spec.reference, &spec.run_options, &cancel)?;
    let candidate_outputs = run_suite(&suite, spec.candidate, &spec.run_options, &cancel)?;
    log_stage(
        &mut events,
        &run_id,
        "evaluate",
        true,
        format!(
            "reference `{}` and candidate `{}` each produced {} outputs",
            spec.reference.id(),
            spec.candidate.id(),
            reference_outputs.len()
        ),
        Vec::new(),
    );

    let report = compare(&reference_outputs, &candidate_outputs, &suite, &spec.defaults)?;
    log_stage(
        &mut events,
        &run_id,
        "equivalence",
        report.all_passed,
        format!(
            "{}/{} cases within tolerance, max_abs={:.2e}",
            report.passed_cases, report.total_cases, report.max_absolute_error
        ),
        vec![String::from("equivalence_report.json")],
    );

    let decision = gate.record_equivalence(&report)?.clone();
    finish_run(
        config,
        spec,
        run_id,
        decision,
        Some(report),
        events,
        &fixture_path,
    )
}

fn stage_message(outcome: &StageOutcome) -> String {
    if outcome.success {
        format!("stage `{}` passed", outcome.stage)
    } else if outcome.detail.is_empty() {
        format!("stage `{}` failed", outcome.stage)
    } else {
        format!("stage `{}` failed: {}", outcome.stage, outcome.detail)
    }
}

fn log_stage(
    events: &mut Vec<PipelineLogEntry>,
    run_id: &str,
    stage: &str,
    passed: bool,
    message: String,
    artifact_refs: Vec<String>,
) {
    events.push(PipelineLogEntry {
        run_id: run_id.to_owned(),
        stage: stage.to_owned(),
        timestamp_ms: now_unix_ms(),
        outcome: String::from(if passed { "pass" } else { "fail" }),
        message,
        artifact_refs,
    });
}

fn finish_run(
    config: &HarnessConfig,
    spec: &PipelineSpec<'_>,
    run_id: String,
    decision: GateDecision,
    report: Option<EquivalenceReport>,
    mut events: Vec<PipelineLogEntry>,
    fixture_path: &std::path::Path,
) -> Result<PipelineRunSummary, HarnessError> {
    log_stage(
        &mut events,
        &run_id,
        "gate",
        decision.outcome == GateOutcome::Proceed,
        format!("{:?}: {}", decision.outcome, decision.reason),
        vec![String::from("gate_decision.json")],
    );

    let artifacts = write_run_artifacts(
        config,
        spec,
        &run_id,
        &decision,
        report.as_ref(),
        &events,
        fixture_path,
    )?;

    Ok(PipelineRunSummary {
        run_id,
        algorithm: spec.algorithm.clone(),
        decision,
        report,
        artifacts,
    })
}

fn write_run_artifacts(
    config: &HarnessConfig,
    spec: &PipelineSpec<'_>,
    run_id: &str,
    decision: &GateDecision,
    report: Option<&EquivalenceReport>,
    events: &[PipelineLogEntry],
    fixture_path: &std::path::Path,
) -> Result<ArtifactBundle, HarnessError> {
    let run_dir = config.run_dir_for(run_id);
    std::fs::create_dir_all(&run_dir).map_err(|source| HarnessError::ArtifactIo {
        path: run_dir.clone(),
        source,
    })?;

    let mut report_path = None;
    let mut checksum_path = None;
    if let Some(report) = report {
        let path = run_dir.join("equivalence_report.json");
        let bytes = serde_json::to_vec_pretty(report)?;
        std::fs::write(&path, &bytes).map_err(|source| HarnessError::ArtifactIo {
            path: path.clone(),
            source,
        })?;

        let sidecar = ChecksumSidecar {
            schema_version: 1,
            source_hash: hash(&bytes).to_hex().to_string(),
            byte_len: bytes.len(),
        };
        let sidecar_path = run_dir.join("equivalence_report.checksum.json");
        let sidecar_bytes = serde_json::to_vec_pretty(&sidecar)?;
        std::fs::write(&sidecar_path, sidecar_bytes).map_err(|source| {
            HarnessError::ArtifactIo {
                path: sidecar_path.clone(),
                source,
            }
        })?;

        report_path = Some(path);
        checksum_path = Some(sidecar_path);
    }

    let decision_path = run_dir.join("gate_decision.json");
    let decision_bytes = serde_json::to_vec_pretty(decision)?;
    std::fs::write(&decision_path, decision_bytes).map_err(|source| {
        HarnessError::ArtifactIo {
            path: decision_path.clone(),
            source,
        }
    })?;

    let events_path = run_dir.join("events.jsonl");
    write_events(&events_path, events)?;

    let summary = RunBundleSummary {
        run_id: run_id.to_owned(),
        algorithm: spec.algorithm.clone(),
        outcome: decision.outcome,
        reason: decision.reason.clone(),
        generated_unix_ms: now_unix_ms(),
        environment: collect_environment_snapshot(&[fixture_path.to_path_buf()]),
    };
    let summary_path = run_dir.join("summary.json");
    let summary_bytes = serde_json::to_vec_pretty(&summary)?;
    std::fs::write(&summary_path, summary_bytes).map_err(|source| {
        HarnessError::ArtifactIo {
            path: summary_path.clone(),
            source,
        }
    })?;

    Ok(ArtifactBundle {
        run_dir,
        report_path,
        checksum_path,
        decision_path,
        events_path,
        summary_path,
    })
}

/// Convenience: load, validate, run both adapters, and compare one
/// fixture without the staged gate. The one-shot equivalence check.
pub fn run_equivalence_check(
    config: &HarnessConfig,
    fixture_name: &str,
    reference: &(dyn Evaluator + Sync),
    candidate: &(dyn Evaluator + Sync),
    defaults: &PipelineDefaults,
    run_options: &RunOptions,
) -> Result<EquivalenceReport, HarnessError> {
    let fixture_path = config.fixture_root.join(fixture_name);
    let suite: ValidatedSuite = Suite::from_path(&fixture_path)?.validate()?;
    let cancel = AtomicBool::new(false);
    let reference_outputs = run_suite(&suite, reference, run_options, &cancel)?;
    let candidate_outputs = run_suite(&suite, candidate, run_options, &cancel)?;
    Ok(compare(
        &reference_outputs,
        &candidate_outputs,
        &suite,
        defaults,
    )?)
}

/// Deterministic fault injector: shifts every output element by a fixed
/// offset. Stands in for a divergent candidate build in demos and
/// failure-path tests.
pub struct PerturbedEvaluator<E> {
    inner: E,
    offset: f64,
}

impl<E> PerturbedEvaluator<E> {
    #[must_use]
    pub fn new(inner: E, offset: f64) -> Self {
        Self { inner, offset }
    }
}

impl<E: Evaluator> Evaluator for PerturbedEvaluator<E> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn tag(&self) -> ImplementationTag {
        self.inner.tag()
    }

    fn evaluate(&self, inputs: &FieldMap) -> Result<FieldMap, EvaluationError> {
        let mut fields = self.inner.evaluate(inputs)?;
        for value in fields.values_mut() {
            *value = match value {
                vg_vectors::FieldValue::Scalar(v) => {
                    vg_vectors::FieldValue::Scalar(*v + self.offset)
                }
                vg_vectors::FieldValue::Vector(vs) => {
                    vg_vectors::FieldValue::Vector(vs.iter().map(|v| v + self.offset).collect())
                }
            };
        }
        Ok(fields)
    }
}
