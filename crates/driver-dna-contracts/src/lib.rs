//! Data contracts for the driver DNA pipeline.
//!
//! Everything the pipeline stages exchange lives here: raw telemetry
//! samples and laps as delivered by the telemetry collaborator, the
//! canonical distance-indexed lap matrix, the grouping context, and the
//! fixed feature schema that every style vector follows.
//!
//! ## Modules
//! - `sample` - Raw telemetry readings and channel names
//! - `lap` - Laps, lap metadata and session keys
//! - `context` - Track type / weather / season grouping keys
//! - `matrix` - The canonical lap matrix produced by the normalizer
//! - `features` - The versioned feature schema
//! - `vector` - Style vectors and aggregated vectors
//! - `stats` - Descriptive statistics shared by the stages

pub mod context;
pub mod features;
pub mod lap;
pub mod matrix;
pub mod sample;
pub mod stats;
pub mod vector;

pub use context::{Context, ContextDimension, Season, TrackType, Weather};
pub use features::{AggregationRule, FEATURE_COUNT, FeatureId, SCHEMA_VERSION};
pub use lap::{Lap, LapMeta, SessionKey};
pub use matrix::CanonicalLapMatrix;
pub use sample::{Channel, TelemetrySample};
pub use vector::{AggregatedVector, DriverDnaVector, NamedFeatures};
