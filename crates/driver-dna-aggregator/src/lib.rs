//! Per-context aggregation of style vectors.
//!
//! All laps of one driver in one [`Context`] collapse into a single
//! [`AggregatedVector`]. Most features use the per-feature median, which
//! keeps a single odd lap from dragging the result. Features whose
//! [`AggregationRule`] is `PooledVariance` combine the median within-lap
//! variance with the between-lap variance of the matching per-lap mean, so
//! lap-to-lap scatter is not lost.
//!
//! Contexts with fewer than `min_laps` usable laps are rejected with
//! [`InsufficientSampleError`]; they are never zero-filled.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

use driver_dna_config::{AggregatorConfig, PipelineConfig};
use driver_dna_contracts::stats::{median, population_variance};
use driver_dna_contracts::{
    AggregatedVector, AggregationRule, Context, DriverDnaVector, FEATURE_COUNT, FeatureId,
};
use driver_dna_errors::{DnaError, InsufficientSampleError};
use tracing::debug;

/// Aggregate the per-lap vectors of one (driver, context).
///
/// # Errors
///
/// Returns [`DnaError::InsufficientSample`] when fewer than `min_laps`
/// vectors are given and [`DnaError::SchemaMismatch`] when the vectors do
/// not share the schema of this build.
pub fn aggregate(
    driver_id: &str,
    context: Context,
    vectors: &[DriverDnaVector],
    min_laps: usize,
) -> Result<AggregatedVector, DnaError> {
    let required = min_laps.max(1);
    if vectors.len() < required {
        return Err(InsufficientSampleError::new(
            driver_id,
            context.to_string(),
            vectors.len(),
            required,
        )
        .into());
    }
    for vector in vectors {
        vector.check_schema()?;
    }

    let mut values = [0.0; FEATURE_COUNT];
    for feature in FeatureId::ALL {
        let value = match feature.aggregation() {
            AggregationRule::Median => median(&column(vectors, feature)),
            AggregationRule::PooledVariance { mean_of } => {
                let within = median(&column(vectors, feature));
                let between = population_variance(&column(vectors, mean_of));
                within.zip(between).map(|(w, b)| w + b)
            }
        };
        if let (Some(slot), Some(value)) = (values.get_mut(feature.index()), value) {
            *slot = value;
        }
    }

    let vector = DriverDnaVector::new(values)?;
    debug!(
        driver = driver_id,
        context = %context,
        laps = vectors.len(),
        "Aggregated context vector"
    );
    Ok(AggregatedVector {
        driver_id: driver_id.to_string(),
        context,
        vector,
        lap_count: vectors.len(),
    })
}

fn column(vectors: &[DriverDnaVector], feature: FeatureId) -> Vec<f64> {
    vectors.iter().map(|v| v.get(feature)).collect()
}

/// [`aggregate`] bound to a configuration.
#[derive(Debug, Clone)]
pub struct VectorAggregator {
    config: AggregatorConfig,
}

impl VectorAggregator {
    /// Create an aggregator.
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Create an aggregator from the pipeline configuration.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self::new(config.aggregator.clone())
    }

    /// Configured minimum lap count.
    pub fn min_laps(&self) -> usize {
        self.config.min_laps
    }

    /// Aggregate with the configured minimum lap count.
    ///
    /// # Errors
    ///
    /// See [`aggregate`].
    pub fn aggregate(
        &self,
        driver_id: &str,
        context: Context,
        vectors: &[DriverDnaVector],
    ) -> Result<AggregatedVector, DnaError> {
        aggregate(driver_id, context, vectors, self.config.min_laps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_dna_contracts::{Season, TrackType, Weather};

    fn ctx() -> Context {
        Context::new(TrackType::Balanced, Weather::Dry, Season(2023))
    }

    fn vector_with(onset: f64, within_variance: f64, pace: f64) -> DriverDnaVector {
        let mut values = [1.0; FEATURE_COUNT];
        for (slot, feature) in values.iter_mut().zip(FeatureId::ALL) {
            *slot = match feature {
                FeatureId::BrakeOnsetDistance => onset,
                FeatureId::BrakeOnsetVariance => within_variance,
                FeatureId::LapPaceRatio => pace,
                _ => 1.0,
            };
        }
        DriverDnaVector::new(values).unwrap_or_default()
    }

    #[test]
    fn test_median_resists_one_outlier() -> Result<(), DnaError> {
        let vectors = [
            vector_with(120.0, 0.0, 1.00),
            vector_with(121.0, 0.0, 1.01),
            vector_with(119.0, 0.0, 1.30),
        ];
        let agg = aggregate("AAA", ctx(), &vectors, 3)?;
        assert!((agg.vector.get(FeatureId::LapPaceRatio) - 1.01).abs() < 1e-12);
        assert!((agg.vector.get(FeatureId::BrakeOnsetDistance) - 120.0).abs() < 1e-12);
        assert_eq!(agg.lap_count, 3);
        Ok(())
    }

    #[test]
    fn test_pooled_variance_adds_between_lap_spread() -> Result<(), DnaError> {
        let vectors = [
            vector_with(100.0, 4.0, 1.0),
            vector_with(140.0, 6.0, 1.0),
            vector_with(90.0, 5.0, 1.0),
        ];
        let agg = aggregate("BBB", ctx(), &vectors, 3)?;
        let expected = 5.0 + 1400.0 / 3.0;
        assert!((agg.vector.get(FeatureId::BrakeOnsetVariance) - expected).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_even_count_median_is_midpoint() -> Result<(), DnaError> {
        let vectors = [vector_with(100.0, 0.0, 1.0), vector_with(110.0, 0.0, 1.2)];
        let agg = aggregate("CCC", ctx(), &vectors, 2)?;
        assert!((agg.vector.get(FeatureId::LapPaceRatio) - 1.1).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_too_few_laps() {
        let vectors = [vector_with(100.0, 0.0, 1.0), vector_with(110.0, 0.0, 1.0)];
        let err = aggregate("DDD", ctx(), &vectors, 3).err();
        assert!(matches!(
            err,
            Some(DnaError::InsufficientSample(InsufficientSampleError {
                laps: 2,
                required: 3,
                ..
            }))
        ));
    }

    #[test]
    fn test_empty_input_with_zero_minimum() {
        let err = aggregate("EEE", ctx(), &[], 0).err();
        assert!(matches!(err, Some(DnaError::InsufficientSample(_))));
    }
}
