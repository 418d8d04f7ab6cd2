//! Feature schema contract violations.
//!
//! These errors mean a caller mixed vectors from different schemas or
//! built a vector with the wrong fields. They are never data issues and
//! are always fatal.

use crate::common::ErrorSeverity;

/// Feature schema mismatch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaMismatchError {
    /// Vectors carry different schema versions
    #[error("Schema version mismatch: expected v{expected}, got v{actual}")]
    VersionMismatch {
        /// Version this build understands
        expected: u16,
        /// Version found on the vector
        actual: u16,
    },

    /// Wrong number of feature values
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Schema dimensionality
        expected: usize,
        /// Supplied dimensionality
        actual: usize,
    },

    /// Feature name not in the schema
    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),

    /// Schema feature absent from the input
    #[error("Missing feature '{0}'")]
    MissingFeature(String),

    /// Feature supplied twice
    #[error("Duplicate feature '{0}'")]
    DuplicateFeature(String),

    /// Feature value is NaN or infinite
    #[error("Feature '{feature}' has non-finite value {value}")]
    NonFiniteFeature {
        /// Feature name
        feature: String,
        /// The offending value
        value: f64,
    },

    /// Fingerprints of two different drivers were compared
    #[error("Cannot compare fingerprints of different drivers: {left} vs {right}")]
    DriverMismatch {
        /// Driver of the first vector
        left: String,
        /// Driver of the second vector
        right: String,
    },
}

impl SchemaMismatchError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }

    /// Schema mismatches always abort the run.
    pub fn is_fatal(&self) -> bool {
        true
    }
}
