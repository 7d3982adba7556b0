#![forbid(unsafe_code)]

//! Structured run-event logging and environment capture.
//!
//! Every pipeline run appends one JSONL event per stage to its run
//! bundle, and the bundle summary records enough of the environment
//! (toolchain, platform, input hashes) to reproduce or triage the run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use blake3::hash;
use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// One stage event in a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineLogEntry {
    pub run_id: String,
    pub stage: String,
    pub timestamp_ms: u128,
    pub outcome: String,
    pub message: String,
    pub artifact_refs: Vec<String>,
}

/// Content hash of one input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputHashEntry {
    pub path: String,
    pub blake3: Option<String>,
    pub status: String,
}

/// Reproducibility snapshot captured once per run bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub rust_version: String,
    pub os: String,
    pub arch: String,
    pub cpu_count: usize,
    pub input_hashes: Vec<InputHashEntry>,
}

/// Hash the given input paths and capture the toolchain/platform facts.
#[must_use]
pub fn collect_environment_snapshot(input_paths: &[PathBuf]) -> EnvironmentSnapshot {
    let mut input_hashes: Vec<InputHashEntry> = input_paths
        .iter()
        .map(|path| {
            if !path.exists() {
                return InputHashEntry {
                    path: path.display().to_string(),
                    blake3: None,
                    status: String::from("missing"),
                };
            }
            match fs::read(path) {
                Ok(bytes) => InputHashEntry {
                    path: path.display().to_string(),
                    blake3: Some(hash(&bytes).to_hex().to_string()),
                    status: String::from("present"),
                },
                Err(_) => InputHashEntry {
                    path: path.display().to_string(),
                    blake3: None,
                    status: String::from("unreadable"),
                },
            }
        })
        .collect();
    input_hashes.sort_by(|a, b| a.path.cmp(&b.path));

    EnvironmentSnapshot {
        rust_version: rustc_version(),
        os: String::from(std::env::consts::OS),
        arch: String::from(std::env::consts::ARCH),
        cpu_count: std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1),
        input_hashes,
    }
}

fn rustc_version() -> String {
    let output = Command::new("rustc").arg("--version").output();
    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_owned(),
        Ok(out) => format!(
            "unavailable (status={} stderr={})",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        ),
        Err(error) => format!("unavailable ({error})"),
    }
}

/// Write the run's events as one JSON document per line.
pub fn write_events(path: &Path, entries: &[PipelineLogEntry]) -> Result<(), HarnessError> {
    let file = File::create(path).map_err(|source| HarnessError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        serde_json::to_writer(&mut writer, entry)?;
        writer
            .write_all(b"\n")
            .map_err(|source| HarnessError::ArtifactIo {
                path: path.to_path_buf(),
                source,
            })?;
    }
    writer.flush().map_err(|source| HarnessError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    })
}
