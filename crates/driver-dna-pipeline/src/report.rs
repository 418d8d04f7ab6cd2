//! Run report: the style table plus everything that was left out and why.

use std::collections::BTreeMap;

use driver_dna_cluster::{CandidateScore, StyleCluster};
use driver_dna_contracts::{Context, ContextDimension};
use driver_dna_errors::InsufficientSampleError;
use driver_dna_features::LapExclusion;
use driver_dna_fingerprint::{DriverAdaptability, FingerprintComparison};
use serde::{Deserialize, Serialize};

use crate::table::StyleTable;

/// A (driver, context) group that did not reach the minimum lap count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextExclusion {
    /// Driver code
    pub driver_id: String,
    /// Grouping context
    pub context: Context,
    /// Usable laps found
    pub laps: usize,
    /// Laps required
    pub required: usize,
}

impl ContextExclusion {
    pub(crate) fn new(context: Context, err: &InsufficientSampleError) -> Self {
        Self {
            driver_id: err.driver.clone(),
            context,
            laps: err.laps,
            required: err.required,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// The output table
    pub table: StyleTable,
    /// Style clusters ordered by id
    pub clusters: Vec<StyleCluster>,
    /// Laps left out, with reasons
    pub lap_exclusions: Vec<LapExclusion>,
    /// Contexts below the minimum lap count
    pub context_exclusions: Vec<ContextExclusion>,
    /// Every cluster candidate, best first
    pub candidates: Vec<CandidateScore>,
    /// Candidates rejected before the chosen one
    pub fallbacks: Vec<CandidateScore>,
    /// Fingerprint comparisons per context dimension
    pub comparisons: BTreeMap<ContextDimension, Vec<FingerprintComparison>>,
    /// Style adaptability per driver
    pub adaptability: Vec<DriverAdaptability>,
}

impl PipelineReport {
    /// Comparisons along one dimension.
    pub fn comparisons_along(&self, dimension: ContextDimension) -> &[FingerprintComparison] {
        self.comparisons
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Comparison of `driver_id` between two contexts, in either order.
    pub fn comparison(
        &self,
        driver_id: &str,
        a: Context,
        b: Context,
    ) -> Option<&FingerprintComparison> {
        self.comparisons.values().flatten().find(|c| {
            c.driver_id == driver_id
                && ((c.context_a == a && c.context_b == b)
                    || (c.context_a == b && c.context_b == a))
        })
    }

    /// Adaptability summary of one driver.
    pub fn adaptability_of(&self, driver_id: &str) -> Option<&DriverAdaptability> {
        self.adaptability.iter().find(|a| a.driver_id == driver_id)
    }
}
