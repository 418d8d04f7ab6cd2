//! Context-level sample count errors.

use crate::common::ErrorSeverity;

/// A (driver, context) group kept too few laps to aggregate.
///
/// The context is dropped from the clustering population; it is never
/// zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Driver {driver} in context {context} has {laps} usable laps (min: {required})")]
pub struct InsufficientSampleError {
    /// Driver identifier
    pub driver: String,
    /// Context display key (`track_type/weather/season`)
    pub context: String,
    /// Laps remaining after extraction
    pub laps: usize,
    /// Configured minimum
    pub required: usize,
}

impl InsufficientSampleError {
    /// Create a new insufficient sample error.
    pub fn new(
        driver: impl Into<String>,
        context: impl Into<String>,
        laps: usize,
        required: usize,
    ) -> Self {
        Self {
            driver: driver.into(),
            context: context.into(),
            laps,
            required,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_driver_and_context() {
        let err = InsufficientSampleError::new("NOR", "street/wet/2023", 2, 3);
        assert_eq!(
            err.to_string(),
            "Driver NOR in context street/wet/2023 has 2 usable laps (min: 3)"
        );
    }
}
