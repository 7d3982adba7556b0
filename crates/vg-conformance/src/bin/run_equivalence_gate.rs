#![forbid(unsafe_code)]

//! One-shot equivalence gate over a fixture: loads the suite, runs the
//! reference and generated estimator adapters, compares, and exits 0
//! only when every case is within tolerance. CI-friendly.

use std::path::PathBuf;
use std::process::ExitCode;

use vg_adapters::RunOptions;
use vg_conformance::{run_equivalence_check, HarnessConfig, PerturbedEvaluator};
use vg_estimator::{GeneratedEstimator, ReferenceEstimator};
use vg_runtime::{PipelineDefaults, TolerancePolicy};

#[derive(Debug, Clone)]
struct CliArgs {
    fixture: String,
    fixture_root: PathBuf,
    atol: Option<f64>,
    rtol: Option<f64>,
    policy: TolerancePolicy,
    parallelism: usize,
    perturb: Option<f64>,
}

#[derive(Debug, Clone)]
enum CliParseError {
    Help,
    Message(String),
}

fn parse_cli_args(args: &[String]) -> Result<CliArgs, CliParseError> {
    let defaults = HarnessConfig::default_paths();
    let mut fixture = String::from("two_state_estimator.json");
    let mut fixture_root = defaults.fixture_root;
    let mut atol = None;
    let mut rtol = None;
    let mut policy = TolerancePolicy::RequireBoth;
    let mut parallelism = 1;
    let mut perturb = None;

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Err(CliParseError::Help),
            "--fixture" => {
                fixture = take_value(args, index, "--fixture")?;
                index += 1;
            }
            "--fixture-root" => {
                fixture_root = PathBuf::from(take_value(args, index, "--fixture-root")?);
                index += 1;
            }
            "--atol" => {
                atol = Some(take_parsed(args, index, "--atol")?);
                index += 1;
            }
            "--rtol" => {
                rtol = Some(take_parsed(args, index, "--rtol")?);
                index += 1;
            }
            "--policy" => {
                let raw = take_value(args, index, "--policy")?;
                policy = match raw.as_str() {
                    "both" => TolerancePolicy::RequireBoth,
                    "either" => TolerancePolicy::EitherSufficient,
                    other => {
                        return Err(CliParseError::Message(format!(
                            "unknown policy `{other}` (expected `both` or `either`)"
                        )))
                    }
                };
                index += 1;
            }
            "--parallel" => {
                parallelism = take_parsed(args, index, "--parallel")?;
                index += 1;
            }
            "--perturb" => {
                perturb = Some(take_parsed(args, index, "--perturb")?);
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
        fixture_root,
        atol,
        rtol,
        policy,
        parallelism,
        perturb,
    })
}

fn take_value(args: &[String], index: usize, flag: &str) -> Result<String, CliParseError> {
    args.get(index + 1)
        .cloned()
        .ok_or_else(|| CliParseError::Message(format!("missing value for {flag}")))
}

fn take_parsed<T: std::str::FromStr>(
    args: &[String],
    index: usize,
    flag: &str,
) -> Result<T, CliParseError> {
    take_value(args, index, flag)?
        .parse()
        .map_err(|_| CliParseError::Message(format!("invalid value for {flag}")))
}

fn print_help() {
    println!(
        "run_equivalence_gate: compare reference and generated estimator outputs over a fixture

USAGE:
    run_equivalence_gate [--fixture NAME] [--fixture-root DIR]
                         [--atol F] [--rtol F] [--policy both|either]
                         [--parallel N] [--perturb OFFSET]

Exit code 0 when every case passes, 1 otherwise."
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
    config.fixture_root = args.fixture_root.clone();

    let mut defaults = PipelineDefaults::default().with_policy(args.policy);
    if let Some(atol) = args.atol {
        defaults = defaults.with_absolute_tolerance(atol);
    }
    if let Some(rtol) = args.rtol {
        defaults = defaults.with_relative_tolerance(rtol);
    }
    let run_options = RunOptions::parallel(args.parallelism);

    let result = match args.perturb {
        Some(offset) => run_equivalence_check(
            &config,
            &args.fixture,
            &ReferenceEstimator,
            &PerturbedEvaluator::new(GeneratedEstimator, offset),
            &defaults,
            &run_options,
        ),
        None => run_equivalence_check(
            &config,
            &args.fixture,
            &ReferenceEstimator,
            &GeneratedEstimator,
            &defaults,
            &run_options,
        ),
    };

    let report = match result {
        Ok(report) => report,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    for case in &report.case_results {
        let verdict = if case.passed { "[PASS]" } else { "[FAIL]" };
        println!(
            "{verdict} {:<30} max_abs={:.2e} (atol={:.0e})",
            case.case_name, case.max_absolute_error, case.tolerance_used.absolute
        );
    }
    println!(
        "{}: {}/{} cases, max_abs={:.2e}, max_rel={:.2e}",
        if report.all_passed { "PASSED" } else { "FAILED" },
        report.passed_cases,
        report.total_cases,
        report.max_absolute_error,
        report.max_relative_error
    );

    if report.all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
