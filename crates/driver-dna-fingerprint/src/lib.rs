//! Fingerprint comparison across contexts.
//!
//! A driver's aggregated vectors in two contexts are compared feature by
//! feature. The weighted distance between them decides whether the driver
//! adapted their style to the change of track type, weather or season.
//!
//! ```
//! use driver_dna_contracts::{AggregatedVector, Context, DriverDnaVector, Season, TrackType, Weather};
//! use driver_dna_fingerprint::{Classification, compare_fingerprint};
//!
//! let dry = Context::new(TrackType::Street, Weather::Dry, Season(2023));
//! let wet = Context::new(TrackType::Street, Weather::Wet, Season(2023));
//! let same = |context| AggregatedVector {
//!     driver_id: "VER".into(),
//!     context,
//!     vector: DriverDnaVector::zeros(),
//!     lap_count: 5,
//! };
//!
//! let cmp = compare_fingerprint(&same(dry), &same(wet))?;
//! assert_eq!(cmp.classification, Classification::Consistent);
//! # Ok::<(), driver_dna_errors::SchemaMismatchError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod adaptability;
pub mod comparator;

pub use adaptability::{DriverAdaptability, adaptability_score};
pub use comparator::{
    Classification, FingerprintComparator, FingerprintComparison, Z_CLIP, compare_fingerprint,
    trait_stability,
};
