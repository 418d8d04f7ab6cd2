//! Configuration validation.
//!
//! Checks every section for ranges and cross-field constraints before a run
//! starts, so stage code can rely on sane values.

use driver_dna_contracts::FEATURE_COUNT;
use driver_dna_errors::{ValidationError, validate, validate_range};

use crate::PipelineConfig;
use crate::sections::{
    AggregatorConfig, ClusterConfig, ComparatorConfig, ExtractorConfig, NormalizerConfig,
    OutlierConfig,
};

/// Largest supported bin count.
pub const MAX_BIN_COUNT: usize = 100_000;

/// Smallest supported bin count.
pub const MIN_BIN_COUNT: usize = 16;

/// Validator for [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self, config: &PipelineConfig) -> Result<(), ValidationError> {
        self.validate_normalizer(&config.normalizer)?;
        self.validate_extractor(&config.extractor)?;
        self.validate_outliers(&config.outliers)?;
        self.validate_aggregator(&config.aggregator)?;
        self.validate_cluster(&config.cluster)?;
        self.validate_comparator(&config.comparator)?;

        for (i, a) in config.reference_contexts.iter().enumerate() {
            validate!(
                !config.reference_contexts.iter().skip(i + 1).any(|b| a == b),
                ValidationError::constraint(format!("reference context {a} listed twice"))
            );
        }
        Ok(())
    }

    fn validate_normalizer(&self, config: &NormalizerConfig) -> Result<(), ValidationError> {
        validate_range!(
            "normalizer.bin_count",
            config.bin_count,
            MIN_BIN_COUNT,
            MAX_BIN_COUNT
        );
        at_least("normalizer.min_raw_samples", config.min_raw_samples, 2)?;
        positive_finite("normalizer.max_interior_gap_m", config.max_interior_gap_m)
    }

    fn validate_extractor(&self, config: &ExtractorConfig) -> Result<(), ValidationError> {
        unit_interval("extractor.brake_on_threshold", config.brake_on_threshold)?;
        unit_interval("extractor.apex_speed_fraction", config.apex_speed_fraction)?;
        finite(
            "extractor.corner_steering_threshold",
            config.corner_steering_threshold,
        )?;
        validate_range!(
            "extractor.corner_steering_threshold",
            config.corner_steering_threshold,
            0.0,
            core::f64::consts::PI
        );
        finite(
            "extractor.significant_corner_ratio",
            config.significant_corner_ratio,
        )?;
        validate!(
            config.significant_corner_ratio >= 1.0,
            ValidationError::out_of_range(
                "extractor.significant_corner_ratio",
                config.significant_corner_ratio,
                1.0,
                f64::MAX
            )
        );
        for (field, bins) in [
            ("extractor.corner_window_bins", config.corner_window_bins),
            ("extractor.intensity_window_bins", config.intensity_window_bins),
            ("extractor.throttle_window_bins", config.throttle_window_bins),
        ] {
            validate_range!(field, bins, 1, MAX_BIN_COUNT);
        }
        Ok(())
    }

    fn validate_outliers(&self, config: &OutlierConfig) -> Result<(), ValidationError> {
        positive_finite("outliers.max_slower_fraction", config.max_slower_fraction)
    }

    fn validate_aggregator(&self, config: &AggregatorConfig) -> Result<(), ValidationError> {
        at_least("aggregator.min_laps", config.min_laps, 1)
    }

    fn validate_cluster(&self, config: &ClusterConfig) -> Result<(), ValidationError> {
        at_least("cluster.k_min", config.k_min, 2)?;
        validate!(
            config.k_max >= config.k_min,
            ValidationError::constraint(format!(
                "cluster.k_max ({}) must be >= cluster.k_min ({})",
                config.k_max, config.k_min
            ))
        );
        validate_range!("cluster.n_init", config.n_init, 1, 1_000);
        validate_range!("cluster.max_iterations", config.max_iterations, 1, 100_000);
        finite("cluster.tolerance", config.tolerance)?;
        validate!(
            config.tolerance >= 0.0,
            ValidationError::out_of_range("cluster.tolerance", config.tolerance, 0.0, f64::MAX)
        );
        finite("cluster.validity_floor", config.validity_floor)?;
        validate_range!("cluster.validity_floor", config.validity_floor, -1.0, 1.0);
        validate_range!(
            "cluster.label_features",
            config.label_features,
            1,
            FEATURE_COUNT
        );
        finite("cluster.balanced_threshold", config.balanced_threshold)?;
        validate!(
            config.balanced_threshold >= 0.0,
            ValidationError::out_of_range(
                "cluster.balanced_threshold",
                config.balanced_threshold,
                0.0,
                f64::MAX
            )
        );
        Ok(())
    }

    fn validate_comparator(&self, config: &ComparatorConfig) -> Result<(), ValidationError> {
        let weights = config.weight_vector()?;
        for (name, weight) in &config.weights {
            finite(&format!("comparator.weights.{name}"), *weight)?;
            validate!(
                *weight >= 0.0,
                ValidationError::out_of_range(
                    format!("comparator.weights.{name}"),
                    *weight,
                    0.0,
                    f64::MAX
                )
            );
        }
        validate!(
            weights.iter().any(|w| *w > 0.0),
            ValidationError::constraint("at least one comparator weight must be positive")
        );
        finite(
            "comparator.adaptation_threshold",
            config.adaptation_threshold,
        )?;
        validate!(
            config.adaptation_threshold >= 0.0,
            ValidationError::out_of_range(
                "comparator.adaptation_threshold",
                config.adaptation_threshold,
                0.0,
                f64::MAX
            )
        );
        Ok(())
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    validate!(
        value.is_finite(),
        ValidationError::custom(format!("{field} must be finite, got {value}"))
    );
    Ok(())
}

fn at_least(field: &str, value: usize, min: usize) -> Result<(), ValidationError> {
    validate!(
        value >= min,
        ValidationError::out_of_range(field, value, min, usize::MAX)
    );
    Ok(())
}

fn positive_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    validate!(
        value > 0.0,
        ValidationError::out_of_range(field, value, f64::MIN_POSITIVE, f64::MAX)
    );
    Ok(())
}

fn unit_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    validate!(
        value > 0.0 && value <= 1.0,
        ValidationError::out_of_range(field, value, 0.0, 1.0)
    );
    Ok(())
}
