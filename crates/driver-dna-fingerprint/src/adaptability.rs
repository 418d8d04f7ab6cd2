//! How often a driver's style archetype changes between contexts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Share of a driver's contexts that land in a distinct style, in percent.
///
/// `(unique - 1) / (n - 1) · 100` for `n` contexts with `unique` distinct
/// cluster ids. A driver seen in fewer than two contexts scores 0.
pub fn adaptability_score(cluster_ids: &[usize]) -> f64 {
    let n = cluster_ids.len();
    if n < 2 {
        return 0.0;
    }
    let unique = cluster_ids.iter().collect::<BTreeSet<_>>().len();
    (unique - 1) as f64 / (n - 1) as f64 * 100.0
}

/// Adaptability of one driver over all of their clustered contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverAdaptability {
    /// Driver code
    pub driver_id: String,
    /// Clustered contexts of the driver
    pub contexts: usize,
    /// Distinct clusters among them
    pub distinct_styles: usize,
    /// [`adaptability_score`] of the driver
    pub score: f64,
}

impl DriverAdaptability {
    /// Summarize the cluster ids of one driver's contexts.
    pub fn new(driver_id: impl Into<String>, cluster_ids: &[usize]) -> Self {
        Self {
            driver_id: driver_id.into(),
            contexts: cluster_ids.len(),
            distinct_styles: cluster_ids.iter().collect::<BTreeSet<_>>().len(),
            score: adaptability_score(cluster_ids),
        }
    }
}
