//! Centralized error types for the driver DNA pipeline
//!
//! This crate provides the error taxonomy shared by every stage of the
//! style pipeline, from lap normalization through fingerprint comparison.
//!
//! # Architecture
//!
//! The error system is organized into several modules:
//!
//! - [`common`]: Top-level error type, classification and context helpers
//! - [`data_quality`]: A single lap is unusable
//! - [`sample`]: A (driver, context) group has too few usable laps
//! - [`clustering`]: No candidate cluster count produced a valid partition
//! - [`schema`]: Feature vectors disagree on schema (caller bug, always fatal)
//! - [`validation`]: Configuration validation errors
//!
//! # Propagation
//!
//! Data-quality and sample errors are local: the offending lap or context
//! is excluded and the run continues. Clustering errors trigger a fallback
//! to the next-best cluster count. Schema errors abort the run.
//!
//! # Example
//!
//! ```
//! use driver_dna_errors::prelude::*;
//!
//! fn check_bins(bins: usize) -> Result<usize> {
//!     if bins < 16 {
//!         return Err(ValidationError::out_of_range("bin_count", bins, 16, 4096).into());
//!     }
//!     Ok(bins)
//! }
//!
//! assert!(check_bins(8).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clustering;
pub mod common;
pub mod data_quality;
pub mod prelude;
pub mod sample;
pub mod schema;
pub mod validation;

pub use clustering::{CandidateRejection, ClusteringConvergenceError};
pub use common::{DnaError, ErrorCategory, ErrorContext, ErrorSeverity, ResultExt};
pub use data_quality::DataQualityError;
pub use sample::InsufficientSampleError;
pub use schema::SchemaMismatchError;
pub use validation::ValidationError;

/// A specialized `Result` type for pipeline operations.
pub type Result<T> = std::result::Result<T, DnaError>;
