//! Property tests: the canonical matrix shape never depends on raw density.

use driver_dna_config::NormalizerConfig;
use driver_dna_contracts::{Lap, TelemetrySample};
use driver_dna_normalizer::TelemetryNormalizer;
use driver_dna_test_helpers::prelude::*;
use proptest::prelude::*;

fn lap_with_density(samples: usize, length_m: f64) -> Lap {
    let step = length_m / samples as f64;
    let samples = (0..samples)
        .map(|i| {
            let d = step * i as f64;
            TelemetrySample::full(d, 40.0 + (d / 100.0).sin() * 10.0, 0.7, 0.1, 4, 0.02, 0.5)
        })
        .collect();
    Lap::new("ALB", "baku", dry_context(), 1, 103.0, samples).with_track_length(length_m)
}

proptest! {
    #[test]
    fn prop_matrix_length_equals_bin_count(
        samples in 20usize..2_000,
        bins in 16usize..1_024,
        length_m in 1_000.0f64..7_000.0,
    ) {
        let config = NormalizerConfig {
            bin_count: bins,
            min_raw_samples: 20,
            max_interior_gap_m: 400.0,
        };
        let lap = lap_with_density(samples, length_m);
        let matrix = TelemetryNormalizer::new(config)
            .normalize(&lap)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(matrix.bin_count(), bins);
        prop_assert!(matrix.is_consistent());
    }

    #[test]
    fn prop_resampled_values_stay_within_raw_range(samples in 20usize..500) {
        let config = NormalizerConfig { bin_count: 128, ..NormalizerConfig::default() };
        let lap = lap_with_density(samples, 4_000.0);
        let matrix = TelemetryNormalizer::new(config)
            .normalize(&lap)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for speed in &matrix.speed_mps {
            prop_assert!((30.0 - 1e-9..=50.0 + 1e-9).contains(speed));
        }
    }
}

#[test]
fn test_fixture_lap_normalizes_losslessly() {
    let config = fixture_config();
    let lap = LapBuilder::new("ALB", dry_context()).build();
    let matrix = must(TelemetryNormalizer::from_pipeline(&config).normalize(&lap));

    assert_eq!(matrix.bin_count(), lap.samples.len());
    for (sample, speed) in lap.samples.iter().zip(&matrix.speed_mps) {
        assert_eq!(sample.speed_mps, Some(*speed));
    }
}
