#![forbid(unsafe_code)]

//! Gate controller for the verigate pipeline.
//!
//! The controller consumes upstream stage outcomes (build, local tests)
//! and the equivalence report, and decides whether the pipeline may
//! proceed to versioning and publishing. Decisions are terminal and
//! immutable; retrying is the responsibility of whoever re-triggers the
//! whole pipeline after a fix.
//!
//! ## Module layout
//!
//! | Module       | Contents                                          |
//! |--------------|---------------------------------------------------|
//! | `controller` | [`GateController`] state machine, [`GateDecision`] |
//! | `evidence`   | [`GateEvidenceLedger`] bounded decision audit trail |
//! | `version`    | Conventional-commit classification → semver bump  |

pub mod controller;
pub mod evidence;
pub mod version;

pub use controller::{
    GateController, GateDecision, GateDetail, GateError, GateOutcome, GateState, ReportSummary,
    StageOutcome,
};
pub use evidence::{GateEvidenceEntry, GateEvidenceLedger};
pub use version::{
    classify_commit, next_version, recommend_bump, release_tag, CommitKind, SemverBump, Version,
    VersionParseError,
};
