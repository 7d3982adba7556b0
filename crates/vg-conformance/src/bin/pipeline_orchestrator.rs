#![forbid(unsafe_code)]

//! Full staged pipeline run over the bundled estimator fixture:
//! upstream stages → case runs → equivalence → gate → version bump and
//! rendered notices. `--fail-build`, `--fail-tests`, and `--perturb`
//! exercise the halt paths.

use std::path::PathBuf;
use std::process::ExitCode;

use vg_adapters::RunOptions;
use vg_conformance::{
    notes::{render_failure_detail, render_failure_notice, render_publish_notice,
        render_release_notes},
    run_pipeline, HarnessConfig, PerturbedEvaluator, PipelineSpec,
};
use vg_estimator::{GeneratedEstimator, ReferenceEstimator};
use vg_gate::{next_version, GateOutcome, StageOutcome, Version};
use vg_runtime::PipelineDefaults;

#[derive(Debug, Clone)]
struct CliArgs {
    fixture: String,
    artifact_root: Option<PathBuf>,
    run_id: Option<String>,
    fail_build: bool,
    fail_tests: bool,
    perturb: Option<f64>,
}

#[derive(Debug, Clone)]
enum CliParseError {
    Help,
    Message(String),
}

fn parse_cli_args(args: &[String]) -> Result<CliArgs, CliParseError> {
    let mut fixture = String::from("two_state_estimator.json");
    let mut artifact_root = None;
    let mut run_id = None;
    let mut fail_build = false;
    let mut fail_tests = false;
    let mut perturb = None;

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Err(CliParseError::Help),
            "--fixture" => {
                fixture = take_value(args, index, "--fixture")?;
                index += 1;
            }
            "--artifact-root" => {
                artifact_root = Some(PathBuf::from(take_value(args, index, "--artifact-root")?));
                index += 1;
            }
            "--run-id" => {
                run_id = Some(take_value(args, index, "--run-id")?);
                index += 1;
            }
            "--fail-build" => fail_build = true,
            "--fail-tests" => fail_tests = true,
            "--perturb" => {
                let raw = take_value(args, index, "--perturb")?;
                perturb = Some(raw.parse().map_err(|_| {
                    CliParseError::Message(String::from("invalid value for --perturb"))
                })?);
                index += 1;
            }
            other => {
                return Err(CliParseError::Message(format!(
                    "unknown argument `{other}`"
                )))
            }
        }
        index += 1;
    }

    Ok(CliArgs {
        fixture,
        artifact_root,
        run_id,
        fail_build,
        fail_tests,
        perturb,
    })
}

fn take_value(args: &[String], index: usize, flag: &str) -> Result<String, CliParseError> {
    args.get(index + 1)
        .cloned()
        .ok_or_else(|| CliParseError::Message(format!("missing value for {flag}")))
}

fn print_help() {
    println!(
        "pipeline_orchestrator: staged equivalence-gated release run

USAGE:
    pipeline_orchestrator [--fixture NAME] [--artifact-root DIR] [--run-id ID]
                          [--fail-build] [--fail-tests] [--perturb OFFSET]"
    );
}

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_cli_args(&raw_args) {
        Ok(args) => args,
        Err(CliParseError::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(CliParseError::Message(message)) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = HarnessConfig::default_paths();
    if let Some(artifact_root) = args.artifact_root.clone() {
        config.artifact_root = artifact_root;
    }

    let build = if args.fail_build {
        StageOutcome::failed("build", "simulated build failure")
    } else {
        StageOutcome::passed("build")
    };
    let local_tests = if args.fail_tests {
        StageOutcome::failed("local-tests", "simulated local test failure")
    } else {
        StageOutcome::passed("local-tests")
    };

    let reference = ReferenceEstimator;
    let perturbed;
    let clean;
    let candidate: &(dyn vg_adapters::Evaluator + Sync) = match args.perturb {
        Some(offset) => {
            perturbed = PerturbedEvaluator::new(GeneratedEstimator, offset);
            &perturbed
        }
        None => {
            clean = GeneratedEstimator;
            &clean
        }
    };

    let spec = PipelineSpec {
        algorithm: String::from("two_state_estimator"),
        fixture_name: args.fixture.clone(),
        build,
        local_tests,
        reference: &reference,
        candidate,
        defaults: PipelineDefaults::default(),
        run_options: RunOptions::default(),
        run_id: args.run_id.clone(),
    };

    let summary = match run_pipeline(&config, &spec) {
        Ok(summary) => summary,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "run {}: {:?} ({})",
        summary.run_id, summary.decision.outcome, summary.decision.reason
    );
    println!("bundle: {}", summary.artifacts.run_dir.display());

    match summary.decision.outcome {
        GateOutcome::Proceed => {
            if let Some(report) = summary.report.as_ref() {
                // Commit log consumption is out of scope here; a fixed
                // feature commit demonstrates the version policy wiring.
                let commits = ["feat(two_state_estimator): add process noise parameter"];
                let current = Version::new(0, 1, 0);
                if let Some(version) = next_version(current, commits, &summary.decision) {
                    println!("version: {current} -> {version}");
                    println!();
                    println!(
                        "{}",
                        render_release_notes(&summary.algorithm, &version, report)
                    );
                    println!(
                        "{}",
                        render_publish_notice(&summary.algorithm, &version, report)
                    );
                }
            }
            ExitCode::SUCCESS
        }
        GateOutcome::Halt => {
            println!();
            println!(
                "{}",
                render_failure_notice(&summary.algorithm, &summary.decision)
            );
            if let Some(report) = summary.report.as_ref() {
                println!("{}", render_failure_detail(&summary.algorithm, report));
            }
            ExitCode::FAILURE
        }
    }
}
