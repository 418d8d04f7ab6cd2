//! Per-lap feature extraction.

use driver_dna_config::{ExtractorConfig, PipelineConfig};
use driver_dna_contracts::stats::{mean, population_std, population_variance};
use driver_dna_contracts::{CanonicalLapMatrix, DriverDnaVector, FEATURE_COUNT, FeatureId};
use driver_dna_errors::DataQualityError;
use tracing::trace;

use crate::corners::{Corner, brake_onset, detect_corners};

/// Braking measurements for one corner.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BrakingZone {
    onset_distance_m: f64,
    intensity: f64,
}

/// Computes a [`DriverDnaVector`] from a canonical lap.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    /// Create an extractor.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Create an extractor from the pipeline configuration.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self::new(config.extractor.clone())
    }

    /// Extract every feature of the schema.
    ///
    /// `personal_best_s` is the driver's reference lap time for the session;
    /// without one `lap_pace_ratio` is 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`DataQualityError::NoCornersDetected`] when the lap has no
    /// significant corner, since corner features are undefined then.
    pub fn extract(
        &self,
        matrix: &CanonicalLapMatrix,
        personal_best_s: Option<f64>,
    ) -> Result<DriverDnaVector, DataQualityError> {
        let lap = matrix.meta.id();
        let corners = detect_corners(&matrix.speed_mps, &self.config);
        if corners.is_empty() {
            return Err(DataQualityError::NoCornersDetected { lap });
        }
        let zones = self.braking_zones(matrix, &corners);

        let mut values = [0.0; FEATURE_COUNT];
        for feature in FeatureId::ALL {
            let value = match feature {
                FeatureId::PeakDeceleration => peak_deceleration(matrix),
                FeatureId::BrakeOnsetDistance => {
                    mean(&onset_distances(&zones)).unwrap_or_default()
                }
                FeatureId::BrakeOnsetVariance => {
                    population_variance(&onset_distances(&zones)).unwrap_or_default()
                }
                FeatureId::BrakeIntensity => {
                    let intensities: Vec<f64> = zones.iter().map(|z| z.intensity).collect();
                    mean(&intensities).unwrap_or_default()
                }
                FeatureId::ThrottleSmoothness => self.throttle_smoothness(matrix, &corners),
                FeatureId::CornerSpeedConsistency => {
                    self.corner_speed_consistency(matrix, &corners)
                }
                FeatureId::RacingLineVariance => {
                    population_std(&matrix.lateral_position).unwrap_or_default()
                }
                FeatureId::LapPaceRatio => lap_pace_ratio(matrix.meta.lap_time_s, personal_best_s),
                FeatureId::SpeedVariability => speed_variability(&matrix.speed_mps),
                FeatureId::GearChangeRate => gear_change_rate(&matrix.gear, matrix.lap_length_m),
                FeatureId::EntryExitBias => {
                    let ratios: Vec<f64> = corners.iter().map(Corner::entry_exit_ratio).collect();
                    mean(&ratios).unwrap_or_default()
                }
                FeatureId::CornerSpeedReduction => {
                    let ratios: Vec<f64> = corners.iter().map(Corner::speed_reduction).collect();
                    mean(&ratios).unwrap_or_default()
                }
            };
            if let Some(slot) = values.get_mut(feature.index()) {
                *slot = value;
            }
        }

        trace!(
            lap = %lap,
            corners = corners.len(),
            braked_corners = zones.len(),
            "Extracted lap features"
        );

        DriverDnaVector::new(values).map_err(|err| DataQualityError::InvalidFeatures {
            lap,
            reason: err.to_string(),
        })
    }

    fn braking_zones(&self, matrix: &CanonicalLapMatrix, corners: &[Corner]) -> Vec<BrakingZone> {
        let mut zones = Vec::with_capacity(corners.len());
        let mut lower_bound = 0;
        for corner in corners {
            if let Some(onset) = brake_onset(
                &matrix.brake,
                corner.apex,
                lower_bound,
                self.config.corner_window_bins,
                self.config.brake_on_threshold,
            ) && let (Some(apex_d), Some(onset_d)) =
                (matrix.distance_m.get(corner.apex), matrix.distance_m.get(onset))
            {
                let end = onset
                    .saturating_add(self.config.intensity_window_bins)
                    .min(matrix.brake.len());
                let intensity = matrix
                    .brake
                    .get(onset..end)
                    .and_then(mean)
                    .unwrap_or_default();
                zones.push(BrakingZone {
                    onset_distance_m: apex_d - onset_d,
                    intensity,
                });
            }
            lower_bound = corner.apex;
        }
        zones
    }

    fn throttle_smoothness(&self, matrix: &CanonicalLapMatrix, corners: &[Corner]) -> f64 {
        let bin_width = matrix.bin_width_m;
        let mut rates = Vec::new();
        for corner in corners {
            let end = corner
                .apex
                .saturating_add(self.config.throttle_window_bins)
                .saturating_add(1)
                .min(matrix.throttle.len());
            if let Some(window) = matrix.throttle.get(corner.apex..end) {
                rates.extend(
                    window
                        .windows(2)
                        .filter_map(|pair| match *pair {
                            [a, b] if b > a => Some((b - a) / bin_width),
                            _ => None,
                        }),
                );
            }
        }
        mean(&rates).unwrap_or_default()
    }

    fn corner_speed_consistency(&self, matrix: &CanonicalLapMatrix, corners: &[Corner]) -> f64 {
        let flagged: Vec<f64> = matrix
            .steering_angle
            .iter()
            .zip(&matrix.speed_mps)
            .filter(|(steer, _)| steer.abs() >= self.config.corner_steering_threshold)
            .map(|(_, speed)| *speed)
            .collect();
        if flagged.len() >= 2 {
            return population_std(&flagged).unwrap_or_default();
        }

        let zoned: Vec<f64> = corners
            .iter()
            .filter_map(|c| matrix.speed_mps.get(c.entry..=c.exit))
            .flatten()
            .copied()
            .collect();
        if zoned.len() >= 2 {
            population_std(&zoned).unwrap_or_default()
        } else {
            0.0
        }
    }
}

fn onset_distances(zones: &[BrakingZone]) -> Vec<f64> {
    zones.iter().map(|z| z.onset_distance_m).collect()
}

/// Largest `-v·dv/ds` between adjacent bins, in m/s².
fn peak_deceleration(matrix: &CanonicalLapMatrix) -> f64 {
    matrix
        .speed_mps
        .windows(2)
        .zip(matrix.distance_m.windows(2))
        .filter_map(|(v, d)| match (v, d) {
            ([v0, v1], [d0, d1]) if d1 > d0 => Some((v0 * v0 - v1 * v1) / (2.0 * (d1 - d0))),
            _ => None,
        })
        .fold(0.0, f64::max)
}

fn lap_pace_ratio(lap_time_s: f64, personal_best_s: Option<f64>) -> f64 {
    match personal_best_s {
        Some(best) if best.is_finite() && best > 0.0 => lap_time_s / best,
        _ => 1.0,
    }
}

fn speed_variability(speed: &[f64]) -> f64 {
    match (mean(speed), population_std(speed)) {
        (Some(m), Some(s)) if m > 0.0 => s / m,
        _ => 0.0,
    }
}

fn gear_change_rate(gear: &[i8], lap_length_m: f64) -> f64 {
    let changes = gear.windows(2).filter(|pair| pair.first() != pair.last()).count();
    if lap_length_m > 0.0 {
        changes as f64 / (lap_length_m / 1000.0)
    } else {
        0.0
    }
}
