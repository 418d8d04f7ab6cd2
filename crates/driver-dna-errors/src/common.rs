//! Common error types and utilities used across all pipeline crates.
//!
//! This module provides the top-level error enum that can wrap all sub-errors,
//! along with error classification, severity levels, and utility traits.

use core::fmt;

use crate::{
    ClusteringConvergenceError, DataQualityError, InsufficientSampleError, SchemaMismatchError,
    ValidationError,
};

/// Top-level error type that can wrap all pipeline sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum DnaError {
    /// A lap could not be normalized or described
    #[error("Data quality error: {0}")]
    DataQuality(#[from] DataQualityError),

    /// A (driver, context) group has too few laps
    #[error("Insufficient samples: {0}")]
    InsufficientSample(#[from] InsufficientSampleError),

    /// No candidate cluster count met the validity criteria
    #[error("Clustering error: {0}")]
    ClusteringConvergence(#[from] ClusteringConvergenceError),

    /// Feature vectors disagree on schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatchError),

    /// Configuration validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl DnaError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DnaError::DataQuality(_) => ErrorCategory::DataQuality,
            DnaError::InsufficientSample(_) => ErrorCategory::Sample,
            DnaError::ClusteringConvergence(_) => ErrorCategory::Clustering,
            DnaError::SchemaMismatch(_) => ErrorCategory::Schema,
            DnaError::Validation(_) => ErrorCategory::Validation,
            DnaError::Io(_) => ErrorCategory::IO,
            DnaError::Config(_) => ErrorCategory::Config,
            DnaError::Other(_) => ErrorCategory::Other,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DnaError::DataQuality(e) => e.severity(),
            DnaError::InsufficientSample(e) => e.severity(),
            DnaError::ClusteringConvergence(e) => e.severity(),
            DnaError::SchemaMismatch(e) => e.severity(),
            DnaError::Validation(e) => e.severity(),
            DnaError::Io(_) => ErrorSeverity::Error,
            DnaError::Config(_) => ErrorSeverity::Error,
            DnaError::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Schema mismatches are the only critical errors; they indicate a
    /// caller bug and must abort the run.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        DnaError::Config(msg.into())
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        DnaError::Other(msg.into())
    }
}

impl From<std::io::Error> for DnaError {
    fn from(e: std::io::Error) -> Self {
        DnaError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unusable lap telemetry
    DataQuality = 0,
    /// Too few laps in a context
    Sample = 1,
    /// Cluster count selection failed
    Clustering = 2,
    /// Feature schema contract violated
    Schema = 3,
    /// Validation errors
    Validation = 4,
    /// Configuration errors
    Config = 5,
    /// I/O errors
    IO = 6,
    /// Other errors
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::DataQuality => write!(f, "DataQuality"),
            ErrorCategory::Sample => write!(f, "Sample"),
            ErrorCategory::Clustering => write!(f, "Clustering"),
            ErrorCategory::Schema => write!(f, "Schema"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the offending item is dropped and the run continues
    Warning = 1,
    /// Error, the current step failed
    Error = 2,
    /// Critical, the run must stop
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Context information for errors.
///
/// Provides additional context for error messages, useful for debugging
/// and for the exclusion records kept in a pipeline report.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The operation that was being performed
    pub operation: String,
    /// Additional context key-value pairs
    pub context: Vec<(String, String)>,
    /// Source location (file:line)
    pub location: Option<String>,
}

impl ErrorContext {
    /// Create a new error context for an operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            context: Vec::new(),
            location: None,
        }
    }

    /// Add a context key-value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Set the source location.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Some(format!("{}:{}", file.into(), line));
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation: {}", self.operation)?;
        for (key, value) in &self.context {
            write!(f, ", {key}: {value}")?;
        }
        if let Some(ref loc) = self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped as [`DnaError::Other`] with the
    /// context prepended. Critical errors keep their original variant so
    /// that fatality is never masked.
    fn context(self, ctx: ErrorContext) -> Result<T, DnaError>;

    /// Add context with an operation name.
    ///
    /// # Errors
    ///
    /// See [`ResultExt::context`].
    fn with_context(self, operation: impl Into<String>) -> Result<T, DnaError>;
}

impl<T, E: Into<DnaError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, ctx: ErrorContext) -> Result<T, DnaError> {
        self.map_err(|e| {
            let err: DnaError = e.into();
            if err.is_recoverable() {
                DnaError::Other(format!("{ctx}: {err}"))
            } else {
                err
            }
        })
    }

    fn with_context(self, operation: impl Into<String>) -> Result<T, DnaError> {
        self.context(ErrorContext::new(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::DataQuality.to_string(), "DataQuality");
        assert_eq!(ErrorCategory::Clustering.to_string(), "Clustering");
        assert_eq!(ErrorCategory::Schema.to_string(), "Schema");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }

    #[test]
    fn test_error_context() {
        let ctx = ErrorContext::new("normalize_lap")
            .with("driver", "VER")
            .with("lap", "12");
        assert!(ctx.to_string().contains("normalize_lap"));
        assert!(ctx.to_string().contains("driver: VER"));
    }

    #[test]
    fn test_dna_error_category() {
        let err: DnaError = DataQualityError::NoCornersDetected { lap: "VER#1".into() }.into();
        assert_eq!(err.category(), ErrorCategory::DataQuality);

        let err = DnaError::config("test");
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_schema_mismatch_is_not_recoverable() {
        let err: DnaError = SchemaMismatchError::DimensionMismatch {
            expected: 12,
            actual: 11,
        }
        .into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_result_ext_adds_context() {
        let result: std::result::Result<(), DataQualityError> =
            Err(DataQualityError::NoCornersDetected { lap: "HAM#3".into() });
        let with_ctx = result.with_context("extract_features");
        assert!(
            with_ctx
                .err()
                .is_some_and(|err| err.to_string().contains("extract_features"))
        );
    }

    #[test]
    fn test_result_ext_keeps_fatal_variant() {
        let result: std::result::Result<(), SchemaMismatchError> =
            Err(SchemaMismatchError::VersionMismatch {
                expected: 1,
                actual: 2,
            });
        let with_ctx = result.with_context("aggregate");
        assert!(matches!(with_ctx, Err(DnaError::SchemaMismatch(_))));
    }

    #[test]
    fn test_context_macro_annotates_recoverable_errors() {
        let result: std::result::Result<(), InsufficientSampleError> = Err(
            InsufficientSampleError::new("AAA", "high_speed/wet/2023", 2, 3),
        );
        let err = result
            .context(crate::error_context!(
                "aggregate",
                "driver" => "AAA",
                "context" => "high_speed/wet/2023",
            ))
            .err();
        assert!(err.is_some_and(|err| {
            matches!(err, DnaError::Other(_))
                && err.to_string().starts_with("operation: aggregate, driver: AAA")
        }));
    }
}
