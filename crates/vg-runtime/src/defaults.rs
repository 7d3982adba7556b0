#![forbid(unsafe_code)]

//! System-level pipeline defaults.
//!
//! These are the last stop in the tolerance resolution order
//! (per-case override → suite global → these defaults) and the only
//! place the fallback bounds live. The equivalence engine itself never
//! hard-codes a tolerance.

use serde::{Deserialize, Serialize};

use crate::policy::TolerancePolicy;

/// Configurable system defaults for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefaults {
    /// Fallback absolute tolerance when neither case nor suite supplies one.
    pub absolute_tolerance: f64,
    /// Fallback relative tolerance; `None` means no relative bound by default.
    pub relative_tolerance: Option<f64>,
    /// Reference magnitudes at or below this threshold are excluded from
    /// relative-error computation to avoid division blow-up near zero.
    pub relative_epsilon: f64,
    /// Upper bound on a single adapter invocation.
    pub adapter_timeout_secs: u64,
    /// Dual-bound semantics applied when a relative bound is configured.
    pub policy: TolerancePolicy,
}

impl PipelineDefaults {
    #[must_use]
    pub fn with_absolute_tolerance(mut self, absolute: f64) -> Self {
        self.absolute_tolerance = absolute;
        self
    }

    #[must_use]
    pub fn with_relative_tolerance(mut self, relative: f64) -> Self {
        self.relative_tolerance = Some(relative);
        self
    }

    #[must_use]
    pub fn with_relative_epsilon(mut self, epsilon: f64) -> Self {
        self.relative_epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_adapter_timeout_secs(mut self, secs: u64) -> Self {
        self.adapter_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: TolerancePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-10,
            relative_tolerance: None,
            relative_epsilon: 1e-15,
            adapter_timeout_secs: 30,
            policy: TolerancePolicy::default(),
        }
    }
}
