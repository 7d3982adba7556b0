#![forbid(unsafe_code)]

//! Tolerance policy definitions for dual-bound comparisons.

use serde::{Deserialize, Serialize};

/// How a case is judged when both an absolute and a relative bound are
/// configured for it.
///
/// - **RequireBoth**: every configured bound must hold (conjunctive). The
///   safer default: a case that drifts in relative terms cannot hide behind
///   a loose absolute bound, and vice versa.
/// - **EitherSufficient**: one satisfied bound is enough (disjunctive).
///   Matches the looser convention some upstream suites assume.
///
/// The active policy is always echoed in the equivalence report so the
/// choice is visible in the gating artifact, never implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TolerancePolicy {
    RequireBoth,
    EitherSufficient,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self::RequireBoth
    }
}
