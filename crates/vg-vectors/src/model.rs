#![forbid(unsafe_code)]

//! Data model for test vector documents.
//!
//! The document shape mirrors the vendor test-vector convention: a suite
//! names its algorithm, carries an optional suite-wide default tolerance,
//! and lists ordered test cases with nested input and expected-output
//! maps plus an optional per-case tolerance override.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::validate::VectorStoreError;

/// Ordered mapping of field name to numeric value.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A named numeric field: either a scalar or a fixed-length vector.
///
/// Untagged so fixture JSON stays in its natural form
/// (`"measurement": 1.0`, `"state": [1.0, 0.0]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl FieldValue {
    /// Flat element view, scalar treated as a length-1 slice.
    #[must_use]
    pub fn elements(&self) -> &[f64] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Vector(values) => values,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Two fields have the same shape when both are scalars or both are
    /// vectors of equal length.
    #[must_use]
    pub fn shape_matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(_), Self::Scalar(_)) => true,
            (Self::Vector(a), Self::Vector(b)) => a.len() == b.len(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.elements().iter().all(|value| value.is_finite())
    }
}

/// Tolerance bounds attached to a case or a suite.
///
/// The absolute bound is always present; the relative bound is an
/// additional optional constraint whose combination semantics are
/// governed by the configured `TolerancePolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSpec {
    pub absolute: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<f64>,
}

impl ToleranceSpec {
    #[must_use]
    pub fn absolute(absolute: f64) -> Self {
        Self {
            absolute,
            relative: None,
        }
    }

    #[must_use]
    pub fn with_relative(mut self, relative: f64) -> Self {
        self.relative = Some(relative);
        self
    }

    /// Bounds must be finite and non-negative.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let absolute_ok = self.absolute.is_finite() && self.absolute >= 0.0;
        let relative_ok = self
            .relative
            .is_none_or(|relative| relative.is_finite() && relative >= 0.0);
        absolute_ok && relative_ok
    }
}

/// One named test vector: inputs, expected outputs, optional tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub inputs: FieldMap,
    pub expected_output: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<ToleranceSpec>,
}

/// An ordered sequence of test cases for one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_tolerance: Option<ToleranceSpec>,
    pub test_cases: Vec<TestCase>,
}

impl Suite {
    /// Parse a suite from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Load a suite from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self, VectorStoreError> {
        let raw = fs::read_to_string(path).map_err(|source| VectorStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| VectorStoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
