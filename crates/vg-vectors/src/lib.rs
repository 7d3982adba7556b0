#![forbid(unsafe_code)]

//! Test vector store for the verigate pipeline.
//!
//! Suites of named test cases are loaded from JSON documents, validated
//! once up front (unique names, coherent expected-output schema, finite
//! numerics, well-formed tolerances), and then shared read-only with the
//! case runners and the equivalence engine.
//!
//! ## Module layout
//!
//! | Module     | Contents                                             |
//! |------------|------------------------------------------------------|
//! | `model`    | [`Suite`], [`TestCase`], [`FieldValue`], [`ToleranceSpec`] |
//! | `validate` | [`ValidatedSuite`], [`VectorStoreError`]             |

pub mod model;
pub mod validate;

pub use model::{FieldMap, FieldValue, Suite, TestCase, ToleranceSpec};
pub use validate::{ValidatedSuite, VectorStoreError};
