//! Driving-style feature extraction.
//!
//! This crate turns one canonical lap into one [`DriverDnaVector`]. The
//! feature order is fixed by [`FeatureId`](driver_dna_contracts::FeatureId);
//! see that type for the list and units.
//!
//! Outlier laps are removed *before* extraction with [`OutlierFilter`].
//!
//! ## Modules
//! - `corners` - Apex, entry/exit and brake-onset detection
//! - `extractor` - The [`FeatureExtractor`]
//! - `outliers` - The [`OutlierFilter`] and exclusion records

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod corners;
pub mod extractor;
pub mod outliers;

use driver_dna_config::PipelineConfig;
use driver_dna_contracts::{DriverDnaVector, Lap};
use driver_dna_errors::DataQualityError;
use driver_dna_normalizer::TelemetryNormalizer;

pub use corners::Corner;
pub use extractor::FeatureExtractor;
pub use outliers::{ExclusionReason, KeptLap, LapExclusion, OutlierFilter, OutlierPartition};

/// Normalize one lap and extract its style vector.
///
/// # Errors
///
/// Returns [`DataQualityError`] if the lap cannot be normalized or has no
/// significant corner.
pub fn extract_features(
    lap: &Lap,
    config: &PipelineConfig,
    personal_best_s: Option<f64>,
) -> Result<DriverDnaVector, DataQualityError> {
    let matrix = TelemetryNormalizer::from_pipeline(config).normalize(lap)?;
    FeatureExtractor::from_pipeline(config).extract(&matrix, personal_best_s)
}
