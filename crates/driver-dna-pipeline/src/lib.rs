//! Driver DNA pipeline orchestration.
//!
//! Runs Normalizer → Extractor → Aggregator → Clusterer → Comparator over a
//! batch of laps and emits a [`StyleTable`] with a diagnostic
//! [`PipelineReport`].
//!
//! Per-lap work and per-context aggregation run in parallel on the rayon
//! pool. Results are merged into ordered maps before the clustering barrier,
//! so the output only depends on the input and the seed.
//!
//! ```no_run
//! use driver_dna_config::PipelineConfig;
//! use driver_dna_pipeline::DnaPipeline;
//!
//! # fn laps() -> Vec<driver_dna_contracts::Lap> { Vec::new() }
//! let config = PipelineConfig::from_path("driver_dna.yaml")?.with_seed(42);
//! let report = DnaPipeline::new(config)?.run(&laps())?;
//! report.table.write_json("style_table.json")?;
//! # Ok::<(), driver_dna_errors::DnaError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod pipeline;
pub mod report;
pub mod table;

pub use pipeline::{DnaPipeline, run_pipeline};
pub use report::{ContextExclusion, PipelineReport};
pub use table::{StyleRow, StyleTable};
