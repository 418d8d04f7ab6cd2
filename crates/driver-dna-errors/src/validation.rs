//! Configuration validation error types.
//!
//! This module provides error types for configuration validation failures
//! including range checks, unknown names, and constraint violations.

use core::fmt;

use crate::common::ErrorSeverity;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Value out of range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Invalid enum value
    #[error("Invalid value '{value}' for field '{field}', expected one of: {expected}")]
    InvalidEnumValue {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Expected values
        expected: String,
    },

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Custom validation error
    #[error("Validation error: {0}")]
    Custom(String),
}

impl ValidationError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    /// Create an out of range error for a numeric value.
    pub fn out_of_range<T: fmt::Debug>(field: impl Into<String>, value: T, min: T, max: T) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            value: format!("{value:?}"),
            min: format!("{min:?}"),
            max: format!("{max:?}"),
        }
    }

    /// Create an invalid enum value error.
    pub fn invalid_enum(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a constraint violation error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        ValidationError::ConstraintViolation(msg.into())
    }

    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        ValidationError::Custom(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_out_of_range() {
        let err = ValidationError::out_of_range("validity_floor", 1.5_f64, -1.0_f64, 1.0_f64);
        let msg = err.to_string();
        assert!(msg.contains("validity_floor"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_validation_error_invalid_enum() {
        let err = ValidationError::invalid_enum("weights", "grip", "peak_deceleration, ...");
        let msg = err.to_string();
        assert!(msg.contains("grip"));
    }

    #[test]
    fn test_validation_error_equality() {
        assert_eq!(
            ValidationError::constraint("k_max < k_min"),
            ValidationError::constraint("k_max < k_min")
        );
    }
}
