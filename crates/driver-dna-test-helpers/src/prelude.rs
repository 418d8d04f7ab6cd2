//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use driver_dna_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{
    CornerSpec, LapBuilder, dry_context, fixture_config, laps_with_onsets, wet_context,
};
pub use crate::init_test_tracing;
pub use crate::must::{must, must_err, must_some, must_with};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
