//! Lap normalization onto a fixed distance grid.

use driver_dna_config::{NormalizerConfig, PipelineConfig};
use driver_dna_contracts::{CanonicalLapMatrix, Lap};
use driver_dna_errors::DataQualityError;
use tracing::trace;

use crate::resample::{RawColumns, hold, interpolate, locate};

/// Resamples raw laps into [`CanonicalLapMatrix`] values of identical shape.
///
/// Bin `i` of `N` is centred at `L·(i + 0.5)/N`, where `L` is the lap's
/// `track_length_m` or, when absent, its last sample distance. Continuous
/// channels are linearly interpolated; gear is held from the previous raw
/// sample. Bins before the first or after the last raw sample take the
/// nearest edge sample.
#[derive(Debug, Clone)]
pub struct TelemetryNormalizer {
    config: NormalizerConfig,
}

impl TelemetryNormalizer {
    /// Create a normalizer.
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Create a normalizer from the pipeline configuration.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self::new(config.normalizer.clone())
    }

    /// Configured bin count.
    pub fn bin_count(&self) -> usize {
        self.config.bin_count
    }

    /// Normalize one lap.
    ///
    /// # Errors
    ///
    /// Returns [`DataQualityError`] when the lap has too few samples, a
    /// missing or non-finite channel, a distance trace that does not
    /// strictly increase, an interior gap wider than the configured maximum,
    /// or a non-positive length.
    pub fn normalize(&self, lap: &Lap) -> Result<CanonicalLapMatrix, DataQualityError> {
        let lap_id = lap.id();
        let count = lap.samples.len();
        if count < self.config.min_raw_samples {
            return Err(DataQualityError::TooFewSamples {
                lap: lap_id,
                count,
                min: self.config.min_raw_samples,
            });
        }

        let raw = RawColumns::from_lap(lap, &lap_id)?;

        if let Some((from_m, gap_m)) = raw.widest_gap()
            && gap_m > self.config.max_interior_gap_m
        {
            return Err(DataQualityError::InteriorGap {
                lap: lap_id,
                from_m,
                gap_m,
                max_gap_m: self.config.max_interior_gap_m,
            });
        }

        let lap_length_m = lap
            .meta
            .track_length_m
            .or_else(|| raw.last_distance())
            .unwrap_or_default();
        if !(lap_length_m.is_finite() && lap_length_m > 0.0) {
            return Err(DataQualityError::InvalidLapLength {
                lap: lap_id,
                length_m: lap_length_m,
            });
        }

        let matrix = self.resample(lap, &raw, lap_length_m);
        trace!(
            lap = %lap_id,
            raw_samples = count,
            bins = matrix.bin_count(),
            lap_length_m,
            "Normalized lap"
        );
        Ok(matrix)
    }

    fn resample(&self, lap: &Lap, raw: &RawColumns, lap_length_m: f64) -> CanonicalLapMatrix {
        let n = self.config.bin_count;
        let bins = n as f64;

        let mut matrix = CanonicalLapMatrix {
            meta: lap.meta.clone(),
            lap_length_m,
            bin_width_m: lap_length_m / bins,
            distance_m: Vec::with_capacity(n),
            speed_mps: Vec::with_capacity(n),
            throttle: Vec::with_capacity(n),
            brake: Vec::with_capacity(n),
            gear: Vec::with_capacity(n),
            steering_angle: Vec::with_capacity(n),
            lateral_position: Vec::with_capacity(n),
        };

        for i in 0..n {
            let centre = lap_length_m * (i as f64 + 0.5) / bins;
            let position = locate(&raw.distance, centre);
            matrix.distance_m.push(centre);
            matrix.speed_mps.push(interpolate(&raw.speed, position));
            matrix.throttle.push(interpolate(&raw.throttle, position));
            matrix.brake.push(interpolate(&raw.brake, position));
            matrix.gear.push(hold(&raw.gear, position));
            matrix
                .steering_angle
                .push(interpolate(&raw.steering, position));
            matrix
                .lateral_position
                .push(interpolate(&raw.lateral, position));
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_dna_contracts::{Context, Season, TelemetrySample, TrackType, Weather};

    fn ctx() -> Context {
        Context::new(TrackType::Technical, Weather::Dry, Season(2024))
    }

    fn config(bin_count: usize) -> NormalizerConfig {
        NormalizerConfig {
            bin_count,
            min_raw_samples: 3,
            max_interior_gap_m: 100.0,
        }
    }

    fn ramp_lap(distances: &[f64]) -> Lap {
        let samples = distances
            .iter()
            .map(|d| TelemetrySample::full(*d, *d, 0.5, 0.0, 3, 0.0, 0.0))
            .collect();
        Lap::new("NOR", "zandvoort", ctx(), 4, 72.0, samples)
    }

    #[test]
    fn test_bin_centres_and_linear_speed() -> Result<(), DataQualityError> {
        let lap = ramp_lap(&[0.0, 50.0, 100.0]);
        let matrix = TelemetryNormalizer::new(config(4)).normalize(&lap)?;
        assert_eq!(matrix.bin_count(), 4);
        assert!(matrix.is_consistent());
        let expected = [12.5, 37.5, 62.5, 87.5];
        for (got, want) in matrix.distance_m.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
        // speed equals distance on the ramp
        for (speed, d) in matrix.speed_mps.iter().zip(&matrix.distance_m) {
            assert!((speed - d).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_track_length_extends_grid_with_edge_values() -> Result<(), DataQualityError> {
        let lap = ramp_lap(&[10.0, 50.0, 90.0]).with_track_length(200.0);
        let matrix = TelemetryNormalizer::new(config(4)).normalize(&lap)?;
        // centres 25, 75, 125, 175; the last two sit past the final sample
        assert!((matrix.speed_at(2).unwrap_or_default() - 90.0).abs() < 1e-9);
        assert!((matrix.speed_at(3).unwrap_or_default() - 90.0).abs() < 1e-9);
        assert!((matrix.bin_width_m - 50.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_too_few_samples() {
        let lap = ramp_lap(&[0.0, 10.0]);
        assert!(matches!(
            TelemetryNormalizer::new(config(8)).normalize(&lap),
            Err(DataQualityError::TooFewSamples {
                count: 2,
                min: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_channel_names_channel_and_index() {
        let mut lap = ramp_lap(&[0.0, 10.0, 20.0, 30.0]);
        if let Some(sample) = lap.samples.get_mut(2) {
            sample.steering_angle = None;
        }
        assert_eq!(
            TelemetryNormalizer::new(config(8)).normalize(&lap).err(),
            Some(DataQualityError::MissingChannel {
                lap: "NOR#4@zandvoort".into(),
                channel: "steering_angle",
                index: 2,
            })
        );
    }

    #[test]
    fn test_non_monotonic_distance() {
        let lap = ramp_lap(&[0.0, 10.0, 10.0, 30.0]);
        assert!(matches!(
            TelemetryNormalizer::new(config(8)).normalize(&lap),
            Err(DataQualityError::NonMonotonicDistance { index: 2, .. })
        ));
    }

    #[test]
    fn test_non_finite_value() {
        let mut lap = ramp_lap(&[0.0, 10.0, 20.0]);
        if let Some(sample) = lap.samples.get_mut(1) {
            sample.throttle = Some(f64::NAN);
        }
        assert!(matches!(
            TelemetryNormalizer::new(config(8)).normalize(&lap),
            Err(DataQualityError::NonFiniteValue {
                channel: "throttle",
                index: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_interior_gap() {
        let lap = ramp_lap(&[0.0, 10.0, 400.0, 410.0]);
        assert!(matches!(
            TelemetryNormalizer::new(config(8)).normalize(&lap),
            Err(DataQualityError::InteriorGap { .. })
        ));
    }

    #[test]
    fn test_invalid_length() {
        let lap = ramp_lap(&[-30.0, -20.0, -10.0]);
        assert!(matches!(
            TelemetryNormalizer::new(config(8)).normalize(&lap),
            Err(DataQualityError::InvalidLapLength { .. })
        ));
    }

    #[test]
    fn test_gear_hold() -> Result<(), DataQualityError> {
        let samples = vec![
            TelemetrySample::full(0.0, 20.0, 1.0, 0.0, 2, 0.0, 0.0),
            TelemetrySample::full(40.0, 30.0, 1.0, 0.0, 3, 0.0, 0.0),
            TelemetrySample::full(80.0, 40.0, 1.0, 0.0, 4, 0.0, 0.0),
        ];
        let lap = Lap::new("NOR", "zandvoort", ctx(), 1, 72.0, samples);
        let matrix = TelemetryNormalizer::new(config(4)).normalize(&lap)?;
        // centres 10, 30, 50, 70
        assert_eq!(matrix.gear, vec![2, 2, 3, 3]);
        Ok(())
    }
}
