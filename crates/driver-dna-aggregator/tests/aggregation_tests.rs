//! Aggregation properties and the brake-variance scenario on synthetic laps.

use driver_dna_aggregator::{VectorAggregator, aggregate};
use driver_dna_contracts::{DriverDnaVector, FEATURE_COUNT, FeatureId};
use driver_dna_errors::DnaError;
use driver_dna_features::extract_features;
use driver_dna_test_helpers::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_single_lap_aggregate_equals_lap_vector(
        values in prop::array::uniform12(-1.0e4f64..1.0e4)
    ) {
        let vector = DriverDnaVector::new(values).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let agg = aggregate("AAA", dry_context(), &[vector], 1)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(agg.vector, vector);
        prop_assert_eq!(agg.lap_count, 1);
    }

    #[test]
    fn prop_median_is_permutation_invariant(
        rows in prop::collection::vec(prop::array::uniform12(0.0f64..100.0), 3..8),
        rotation in 0usize..8,
    ) {
        let vectors: Vec<DriverDnaVector> = rows
            .iter()
            .filter_map(|row| DriverDnaVector::new(*row).ok())
            .collect();
        let mut rotated = vectors.clone();
        rotated.rotate_left(rotation % vectors.len().max(1));
        let a = aggregate("AAA", dry_context(), &vectors, 3)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let b = aggregate("AAA", dry_context(), &rotated, 3)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for feature in FeatureId::ALL {
            prop_assert!((a.vector.get(feature) - b.vector.get(feature)).abs() < 1e-9);
        }
    }
}

#[test]
fn test_brake_onset_variance_pools_lap_to_lap_scatter() -> TestResult {
    let config = fixture_config();
    let aggregator = VectorAggregator::from_pipeline(&config);
    let vectors = |driver: &str, onsets: &[f64]| -> Result<Vec<DriverDnaVector>, DnaError> {
        laps_with_onsets(driver, dry_context(), onsets)
            .iter()
            .map(|lap| extract_features(lap, &config, Some(90.0)).map_err(DnaError::from))
            .collect()
    };

    let consistent = aggregator.aggregate("AAA", dry_context(), &vectors("AAA", &[120.0, 121.0, 119.0])?)?;
    let erratic = aggregator.aggregate("BBB", dry_context(), &vectors("BBB", &[100.0, 140.0, 90.0])?)?;

    let a = consistent.vector.get(FeatureId::BrakeOnsetVariance);
    let b = erratic.vector.get(FeatureId::BrakeOnsetVariance);
    assert!((a - 2.0 / 3.0).abs() < 1e-9, "consistent driver variance {a}");
    assert!((b - 1400.0 / 3.0).abs() < 1e-9, "erratic driver variance {b}");
    Ok(())
}

#[test]
fn test_future_schema_cannot_enter_aggregation() -> TestResult {
    let json = format!(
        r#"{{"schema_version": 1, "features": {{{}}}}}"#,
        FeatureId::ALL
            .iter()
            .map(|f| format!("\"{}\": 1.0", f.name()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let current: DriverDnaVector = serde_json::from_str(&json)?;
    // A future schema cannot be decoded into this build at all.
    let future = json.replace("\"schema_version\": 1", "\"schema_version\": 2");
    assert!(serde_json::from_str::<DriverDnaVector>(&future).is_err());

    let agg = aggregate("AAA", dry_context(), &[current; 3], 3)?;
    assert_eq!(agg.vector.values(), &[1.0; FEATURE_COUNT]);
    Ok(())
}
