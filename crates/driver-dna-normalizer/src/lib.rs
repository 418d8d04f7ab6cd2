//! Telemetry normalization for the driver DNA pipeline.
//!
//! Raw laps arrive with different sample counts and spacings. The
//! [`TelemetryNormalizer`] resamples every lap onto the same number of
//! equal-width distance bins so that later stages can compare laps bin by
//! bin, regardless of how densely the source recorded them.
//!
//! # Example
//!
//! ```
//! use driver_dna_config::NormalizerConfig;
//! use driver_dna_contracts::{Context, Lap, Season, TelemetrySample, TrackType, Weather};
//! use driver_dna_normalizer::TelemetryNormalizer;
//!
//! let ctx = Context::new(TrackType::Balanced, Weather::Dry, Season(2024));
//! let samples = (0..40)
//!     .map(|i| TelemetrySample::full(f64::from(i) * 10.0, 50.0, 1.0, 0.0, 5, 0.0, 0.0))
//!     .collect();
//! let lap = Lap::new("PIA", "suzuka", ctx, 1, 91.0, samples);
//!
//! let normalizer = TelemetryNormalizer::new(NormalizerConfig { bin_count: 64, ..Default::default() });
//! let matrix = normalizer.normalize(&lap)?;
//! assert_eq!(matrix.bin_count(), 64);
//! # Ok::<(), driver_dna_errors::DataQualityError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod normalizer;
mod resample;

pub use normalizer::TelemetryNormalizer;
