#![forbid(unsafe_code)]

//! Verigate runtime: shared configuration and decision infrastructure for
//! the equivalence-verification pipeline.
//!
//! ## Module layout
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | `policy`   | [`TolerancePolicy`] enum (RequireBoth / EitherSufficient) |
//! | `defaults` | [`PipelineDefaults`]: system-level tolerance and limits   |
//! | `logging`  | [`TestLogEntry`] structured JSONL test logging            |

pub mod defaults;
pub mod logging;
pub mod policy;

// ── Re-exports: preserve the flat public API ────────────────────────
pub use defaults::PipelineDefaults;
pub use logging::{TestLogEntry, TestLogLevel, TestResult};
pub use policy::TolerancePolicy;

use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp utility for report and evidence entries.
#[must_use]
pub fn now_unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis())
}

// ═══════════════════════════════════════════════════════════════════
// Test Helpers: shared assertion utilities
// ═══════════════════════════════════════════════════════════════════

/// Assert two f64 values are close within combined absolute and relative tolerance.
///
/// Uses the formula: |actual - expected| <= atol + rtol * |expected|
pub fn assert_close(actual: f64, expected: f64, atol: f64, rtol: f64) {
    let tol = atol + rtol * expected.abs();
    assert!(
        (actual - expected).abs() <= tol,
        "assert_close failed: actual={actual} expected={expected} diff={} tol={tol} (atol={atol}, rtol={rtol})",
        (actual - expected).abs()
    );
}

/// Assert two f64 slices are element-wise close within tolerance.
pub fn assert_close_slice(actual: &[f64], expected: &[f64], atol: f64, rtol: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "assert_close_slice: length mismatch: actual={} expected={}",
        actual.len(),
        expected.len()
    );
    for (idx, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let tol = atol + rtol * e.abs();
        assert!(
            (a - e).abs() <= tol,
            "assert_close_slice[{idx}]: actual={a} expected={e} diff={} tol={tol} (atol={atol}, rtol={rtol})",
            (a - e).abs()
        );
    }
}

/// Check if a value is within absolute tolerance of expected.
#[must_use]
pub fn within_tolerance(actual: f64, expected: f64, atol: f64, rtol: f64) -> bool {
    let tol = atol + rtol * expected.abs();
    (actual - expected).abs() <= tol
}
