//! Per-stage configuration sections.
//!
//! Every field has a serde default so partial YAML files only need to name
//! the values they change.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use driver_dna_contracts::{FEATURE_COUNT, FeatureId};
use driver_dna_errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Resampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Number of distance bins (N) every lap is resampled onto.
    pub bin_count: usize,
    /// Laps with fewer raw samples are rejected.
    pub min_raw_samples: usize,
    /// Widest allowed distance gap between consecutive raw samples.
    pub max_interior_gap_m: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            bin_count: 500,
            min_raw_samples: 20,
            max_interior_gap_m: 250.0,
        }
    }
}

/// Thresholds and windows used by the feature extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Brake fraction at which braking is considered on.
    pub brake_on_threshold: f64,
    /// Absolute steering angle (rad) that flags a bin as curved.
    pub corner_steering_threshold: f64,
    /// Apex candidates must be slower than this fraction of lap max speed.
    pub apex_speed_fraction: f64,
    /// A corner is significant when entry or exit exceeds apex speed by this ratio.
    pub significant_corner_ratio: f64,
    /// Bins searched on either side of an apex for entry, exit and brake onset.
    pub corner_window_bins: usize,
    /// Bins after a brake onset averaged into brake intensity.
    pub intensity_window_bins: usize,
    /// Bins after an apex scanned for throttle application.
    pub throttle_window_bins: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            brake_on_threshold: 0.1,
            corner_steering_threshold: 0.05,
            apex_speed_fraction: 0.7,
            significant_corner_ratio: 1.2,
            corner_window_bins: 50,
            intensity_window_bins: 5,
            throttle_window_bins: 20,
        }
    }
}

/// Lap-time outlier rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlierConfig {
    /// Laps slower than personal best × (1 + this) are excluded.
    pub max_slower_fraction: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            max_slower_fraction: 0.07,
        }
    }
}

/// Per-context aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Minimum usable laps per (driver, context).
    pub min_laps: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { min_laps: 3 }
    }
}

/// Clustering and archetype labelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    /// Smallest cluster count tried.
    pub k_min: usize,
    /// Largest cluster count tried.
    pub k_max: usize,
    /// k-means++ restarts per k.
    pub n_init: usize,
    /// Iteration cap per restart.
    pub max_iterations: usize,
    /// Convergence threshold on centroid movement.
    pub tolerance: f64,
    /// Candidates with a lower mean silhouette are rejected.
    pub validity_floor: f64,
    /// Number of dominant features named in a cluster label.
    pub label_features: usize,
    /// Below this |z| for every feature a cluster is labelled balanced.
    pub balanced_threshold: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 6,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-6,
            validity_floor: 0.1,
            label_features: 2,
            balanced_threshold: 0.5,
        }
    }
}

impl ClusterConfig {
    /// Configured cluster-count range.
    pub fn k_range(&self) -> RangeInclusive<usize> {
        self.k_min..=self.k_max
    }
}

/// Fingerprint comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparatorConfig {
    /// Per-feature weights by name; features not listed weigh 1.0.
    pub weights: BTreeMap<String, f64>,
    /// Divergence above which a pair is classified as adapted.
    pub adaptation_threshold: f64,
    /// Divide each weight by the population variance of its feature.
    pub scale_by_population: bool,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            adaptation_threshold: 1.0,
            scale_by_population: true,
        }
    }
}

impl ComparatorConfig {
    /// Resolve named weights into schema order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEnumValue`] for an unknown feature
    /// name.
    pub fn weight_vector(&self) -> Result<[f64; FEATURE_COUNT], ValidationError> {
        let mut weights = [1.0; FEATURE_COUNT];
        for (name, weight) in &self.weights {
            let feature = FeatureId::from_name(name).ok_or_else(|| {
                ValidationError::invalid_enum("comparator.weights", name, FeatureId::names())
            })?;
            if let Some(slot) = weights.get_mut(feature.index()) {
                *slot = *weight;
            }
        }
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_vector_defaults_to_one() -> Result<(), ValidationError> {
        let mut config = ComparatorConfig::default();
        config.weights.insert("lap_pace_ratio".into(), 4.0);
        let weights = config.weight_vector()?;
        for feature in FeatureId::ALL {
            let expected = if feature == FeatureId::LapPaceRatio { 4.0 } else { 1.0 };
            let actual = weights.get(feature.index()).copied().unwrap_or(f64::NAN);
            assert!((actual - expected).abs() < f64::EPSILON, "{feature}");
        }
        Ok(())
    }

    #[test]
    fn test_weight_vector_rejects_unknown_name() {
        let mut config = ComparatorConfig::default();
        config.weights.insert("tyre_wear".into(), 2.0);
        assert!(matches!(
            config.weight_vector(),
            Err(ValidationError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_k_range() {
        let config = ClusterConfig {
            k_min: 3,
            k_max: 5,
            ..ClusterConfig::default()
        };
        assert_eq!(config.k_range().collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
