//! Lap-level data quality errors.
//!
//! A lap that fails any of these checks is excluded from the run and
//! recorded; it never aborts the pipeline.

use crate::common::ErrorSeverity;

/// Reasons a single lap cannot be normalized or described.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataQualityError {
    /// Fewer raw samples than the normalizer requires
    #[error("Lap {lap} has {count} samples (min: {min})")]
    TooFewSamples {
        /// Lap identifier
        lap: String,
        /// Number of raw samples
        count: usize,
        /// Minimum required sample count
        min: usize,
    },

    /// A required channel is absent
    #[error("Lap {lap} is missing channel '{channel}' at sample {index}")]
    MissingChannel {
        /// Lap identifier
        lap: String,
        /// Channel name
        channel: &'static str,
        /// First sample index lacking the channel
        index: usize,
    },

    /// Distance trace does not strictly increase
    #[error("Lap {lap} has non-monotonic distance at sample {index}: {previous} -> {current}")]
    NonMonotonicDistance {
        /// Lap identifier
        lap: String,
        /// Sample index where the trace stops increasing
        index: usize,
        /// Distance of the previous sample
        previous: f64,
        /// Distance of the offending sample
        current: f64,
    },

    /// A channel value is NaN or infinite
    #[error("Lap {lap} has a non-finite '{channel}' value at sample {index}")]
    NonFiniteValue {
        /// Lap identifier
        lap: String,
        /// Channel name
        channel: &'static str,
        /// Sample index
        index: usize,
    },

    /// Consecutive samples are too far apart to interpolate between
    #[error("Lap {lap} has a {gap_m:.1} m gap after {from_m:.1} m (max: {max_gap_m:.1} m)")]
    InteriorGap {
        /// Lap identifier
        lap: String,
        /// Distance where the gap starts
        from_m: f64,
        /// Gap width in metres
        gap_m: f64,
        /// Maximum tolerated gap
        max_gap_m: f64,
    },

    /// Lap length is zero, negative or not finite
    #[error("Lap {lap} has invalid length {length_m} m")]
    InvalidLapLength {
        /// Lap identifier
        lap: String,
        /// The offending length
        length_m: f64,
    },

    /// No significant corner was found, so corner features are undefined
    #[error("Lap {lap} has no detectable corners")]
    NoCornersDetected {
        /// Lap identifier
        lap: String,
    },

    /// Extracted values could not form a valid style vector
    #[error("Lap {lap} produced an invalid feature vector: {reason}")]
    InvalidFeatures {
        /// Lap identifier
        lap: String,
        /// Underlying schema violation
        reason: String,
    },
}

impl DataQualityError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    /// Identifier of the lap this error refers to.
    pub fn lap(&self) -> &str {
        match self {
            DataQualityError::TooFewSamples { lap, .. }
            | DataQualityError::MissingChannel { lap, .. }
            | DataQualityError::NonMonotonicDistance { lap, .. }
            | DataQualityError::NonFiniteValue { lap, .. }
            | DataQualityError::InteriorGap { lap, .. }
            | DataQualityError::InvalidLapLength { lap, .. }
            | DataQualityError::NoCornersDetected { lap }
            | DataQualityError::InvalidFeatures { lap, .. } => lap,
        }
    }

    /// Short machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            DataQualityError::TooFewSamples { .. } => "too_few_samples",
            DataQualityError::MissingChannel { .. } => "missing_channel",
            DataQualityError::NonMonotonicDistance { .. } => "non_monotonic_distance",
            DataQualityError::NonFiniteValue { .. } => "non_finite_value",
            DataQualityError::InteriorGap { .. } => "interior_gap",
            DataQualityError::InvalidLapLength { .. } => "invalid_lap_length",
            DataQualityError::NoCornersDetected { .. } => "no_corners",
            DataQualityError::InvalidFeatures { .. } => "invalid_features",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_channel_message() {
        let err = DataQualityError::MissingChannel {
            lap: "LEC#4".into(),
            channel: "throttle",
            index: 17,
        };
        let msg = err.to_string();
        assert!(msg.contains("throttle"));
        assert!(msg.contains("17"));
        assert_eq!(err.lap(), "LEC#4");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errs = [
            DataQualityError::TooFewSamples {
                lap: String::new(),
                count: 1,
                min: 2,
            },
            DataQualityError::NoCornersDetected { lap: String::new() },
            DataQualityError::InvalidLapLength {
                lap: String::new(),
                length_m: 0.0,
            },
        ];
        let codes: std::collections::HashSet<_> = errs.iter().map(DataQualityError::code).collect();
        assert_eq!(codes.len(), errs.len());
    }

    #[test]
    fn test_severity_is_warning() {
        let err = DataQualityError::NoCornersDetected { lap: "x".into() };
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }
}
