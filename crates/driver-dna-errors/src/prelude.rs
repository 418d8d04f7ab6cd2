//! Prelude module for convenient error handling imports.
//!
//! # Example
//!
//! ```
//! use driver_dna_errors::prelude::*;
//!
//! fn min_laps(value: usize) -> Result<usize> {
//!     if value == 0 {
//!         return Err(ValidationError::out_of_range("min_laps", value, 1, usize::MAX).into());
//!     }
//!     Ok(value)
//! }
//!
//! assert!(min_laps(3).is_ok());
//! ```

pub use crate::{
    Result,
    clustering::{CandidateRejection, ClusteringConvergenceError},
    common::{DnaError, ErrorCategory, ErrorContext, ErrorSeverity, ResultExt},
    data_quality::DataQualityError,
    sample::InsufficientSampleError,
    schema::SchemaMismatchError,
    validation::ValidationError,
};

/// Macro for creating an error context with key-value pairs.
///
/// # Example
///
/// ```
/// use driver_dna_errors::error_context;
///
/// let ctx = error_context!("aggregate", "driver" => "VER", "context" => "street/dry/2023");
/// assert!(ctx.to_string().contains("VER"));
/// ```
#[macro_export]
macro_rules! error_context {
    ($operation:expr, $($key:expr => $value:expr),* $(,)?) => {
        {
            let mut ctx = $crate::ErrorContext::new($operation);
            $(
                ctx = ctx.with($key, $value);
            )*
            ctx
        }
    };
}

/// Return early with the given error when a condition does not hold.
#[macro_export]
macro_rules! validate {
    ($condition:expr, $error:expr) => {
        if !$condition {
            return Err($error.into());
        }
    };
}

/// Return early with an out of range validation error.
#[macro_export]
macro_rules! validate_range {
    ($field:expr, $value:expr, $min:expr, $max:expr) => {
        if $value < $min || $value > $max {
            return Err($crate::ValidationError::out_of_range($field, $value, $min, $max).into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_macro() {
        let ctx = error_context!(
            "normalize",
            "driver" => "ALO",
            "lap" => "7"
        );
        assert!(ctx.to_string().contains("normalize"));
        assert!(ctx.to_string().contains("lap: 7"));
    }

    #[test]
    fn test_validate_macro() {
        fn test_fn() -> Result<()> {
            validate!(false, ValidationError::custom("test"));
            Ok(())
        }
        assert!(matches!(test_fn(), Err(DnaError::Validation(_))));
    }

    #[test]
    fn test_validate_range_macro() {
        fn test_fn(bins: usize) -> Result<()> {
            validate_range!("bin_count", bins, 16_usize, 4096_usize);
            Ok(())
        }
        assert!(test_fn(512).is_ok());
        assert!(matches!(test_fn(4), Err(DnaError::Validation(_))));
    }
}
