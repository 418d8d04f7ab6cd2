//! Shared test utilities for the driver DNA pipeline.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fixtures`] - Synthetic laps with hand-predictable features
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! driver-dna-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use driver_dna_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(
    clippy::unwrap_used,
    clippy::panic,
    reason = "must helpers turn failures into test panics"
)]

pub mod fixtures;
pub mod must;
pub mod prelude;

pub use must::*;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `driver_dna=debug`.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("driver_dna=debug"));
    // Another test may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
