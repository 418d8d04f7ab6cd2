//! Style clustering of aggregated driver vectors.
//!
//! The population is standardized once, then partitioned for every
//! candidate cluster count. Candidates are ranked by mean silhouette and
//! validated in rank order; a degenerate candidate is logged and the next
//! best one is tried.
//!
//! ## Modules
//! - `standardize` - Population z-scores ([`Standardizer`])
//! - `kmeans` - The [`PartitionAlgorithm`] seam and seeded [`KMeans`]
//! - `silhouette` - Mean silhouette coefficient
//! - `labels` - Trait-phrase labels from standardized centroids

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod kmeans;
pub mod labels;
pub mod silhouette;
pub mod standardize;

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use driver_dna_config::{ClusterConfig, PipelineConfig};
use driver_dna_contracts::{AggregatedVector, Context, FEATURE_COUNT, FeatureId};
use driver_dna_errors::{CandidateRejection, ClusteringConvergenceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use kmeans::{KMeans, Partition, PartitionAlgorithm};
pub use labels::BALANCED_LABEL;
pub use silhouette::mean_silhouette;
pub use standardize::{Point, Standardizer};

/// Smallest population a silhouette can be computed for.
pub const MIN_POPULATION: usize = 3;

/// Score of one candidate cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Cluster count
    pub k: usize,
    /// Mean silhouette coefficient
    pub silhouette: f64,
    /// Within-cluster sum of squares in standardized units
    pub inertia: f64,
    /// Clusters with at least one member
    pub non_empty_clusters: usize,
}

impl CandidateScore {
    fn rejection(&self) -> CandidateRejection {
        CandidateRejection {
            k: self.k,
            silhouette: self.silhouette,
            non_empty_clusters: self.non_empty_clusters,
        }
    }

    fn is_valid(&self, floor: f64) -> bool {
        self.non_empty_clusters >= 2 && self.silhouette >= floor
    }
}

/// One member of a style cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Driver code
    pub driver_id: String,
    /// Context of the aggregated vector
    pub context: Context,
}

/// A style archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCluster {
    /// Cluster id, numbered by first appearance in the input
    pub id: usize,
    /// Member mean in raw feature units
    pub centroid: Point,
    /// Member mean in standardized units
    pub standardized_centroid: Point,
    /// Members in input order
    pub members: Vec<ClusterMember>,
    /// Short trait-phrase label
    pub label: String,
    /// Most distinctive features with z-scores
    pub description: String,
}

impl StyleCluster {
    /// Raw centroid value of one feature.
    pub fn centroid_of(&self, feature: FeatureId) -> f64 {
        self.centroid.get(feature.index()).copied().unwrap_or_default()
    }

    /// Standardized centroid value of one feature.
    pub fn z_of(&self, feature: FeatureId) -> f64 {
        self.standardized_centroid
            .get(feature.index())
            .copied()
            .unwrap_or_default()
    }
}

/// Result of [`cluster`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOutcome {
    /// Cluster id per input vector, in input order
    pub assignments: Vec<usize>,
    /// Clusters ordered by id
    pub clusters: Vec<StyleCluster>,
    /// Standardization fitted over the whole input
    pub standardizer: Standardizer,
    /// Cluster count of the accepted candidate
    pub chosen_k: usize,
    /// Every candidate, best first
    pub candidates: Vec<CandidateScore>,
    /// Candidates rejected before the accepted one, in the order tried
    pub fallbacks: Vec<CandidateScore>,
}

impl ClusteringOutcome {
    /// Cluster of the input vector at `index`.
    pub fn cluster_of(&self, index: usize) -> Option<&StyleCluster> {
        self.assignments
            .get(index)
            .and_then(|id| self.clusters.get(*id))
    }
}

/// Cluster aggregated vectors, choosing k from `k_range` by silhouette.
///
/// # Errors
///
/// Returns [`ClusteringConvergenceError`] when fewer than
/// [`MIN_POPULATION`] vectors are given, when no k in `k_range` fits
/// `2..=n-1`, or when every candidate is degenerate.
pub fn cluster(
    vectors: &[AggregatedVector],
    k_range: RangeInclusive<usize>,
    seed: u64,
    config: &ClusterConfig,
) -> Result<ClusteringOutcome, ClusteringConvergenceError> {
    let config = ClusterConfig {
        k_min: *k_range.start(),
        k_max: *k_range.end(),
        ..config.clone()
    };
    StyleClusterer::new(config).cluster(vectors, seed)
}

/// Clusterer bound to a configuration and a partitioning algorithm.
#[derive(Debug, Clone)]
pub struct StyleClusterer<A = KMeans> {
    config: ClusterConfig,
    algorithm: A,
}

impl StyleClusterer<KMeans> {
    /// Clusterer using seeded k-means.
    pub fn new(config: ClusterConfig) -> Self {
        let algorithm = KMeans::new(&config);
        Self { config, algorithm }
    }

    /// Clusterer from the pipeline configuration.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self::new(config.cluster.clone())
    }
}

impl<A: PartitionAlgorithm> StyleClusterer<A> {
    /// Clusterer using another partitioning algorithm.
    pub fn with_algorithm(config: ClusterConfig, algorithm: A) -> Self {
        Self { config, algorithm }
    }

    /// Run model selection over the configured k range.
    ///
    /// # Errors
    ///
    /// See [`cluster`].
    pub fn cluster(
        &self,
        vectors: &[AggregatedVector],
        seed: u64,
    ) -> Result<ClusteringOutcome, ClusteringConvergenceError> {
        let count = vectors.len();
        if count < MIN_POPULATION {
            return Err(ClusteringConvergenceError::TooFewVectors {
                count,
                required: MIN_POPULATION,
            });
        }

        let k_min = self.config.k_min.max(2);
        let k_max = self.config.k_max.min(count.saturating_sub(1));
        if k_min > k_max {
            return Err(ClusteringConvergenceError::NoFeasibleK {
                k_min: self.config.k_min,
                k_max: self.config.k_max,
                count,
            });
        }

        let standardizer = Standardizer::fit(vectors.iter().map(|v| &v.vector));
        let points: Vec<Point> = vectors
            .iter()
            .map(|v| standardizer.transform(&v.vector))
            .collect();

        let mut scored: Vec<(CandidateScore, Partition)> = (k_min..=k_max)
            .map(|k| {
                let partition = self.algorithm.partition(&points, k, seed);
                let score = CandidateScore {
                    k,
                    silhouette: mean_silhouette(&points, &partition.assignments, k),
                    inertia: partition.inertia,
                    non_empty_clusters: partition.non_empty_clusters(),
                };
                debug!(
                    algorithm = self.algorithm.name(),
                    k,
                    silhouette = score.silhouette,
                    inertia = score.inertia,
                    "Scored cluster candidate"
                );
                (score, partition)
            })
            .collect();
        scored.sort_by(|(a, _), (b, _)| rank(a, b));
        let candidates: Vec<CandidateScore> = scored.iter().map(|(score, _)| *score).collect();

        let floor = self.config.validity_floor;
        let mut fallbacks = Vec::new();
        for (score, partition) in scored {
            if !score.is_valid(floor) {
                let err = ClusteringConvergenceError::Degenerate {
                    candidate: score.rejection(),
                    floor,
                };
                warn!(error = %err, "Rejecting cluster candidate");
                fallbacks.push(score);
                continue;
            }

            let (assignments, clusters) =
                self.build_clusters(vectors, &points, &partition.assignments, &standardizer);
            return Ok(ClusteringOutcome {
                assignments,
                clusters,
                standardizer,
                chosen_k: score.k,
                candidates,
                fallbacks,
            });
        }

        Err(ClusteringConvergenceError::AllCandidatesRejected {
            candidates: fallbacks.iter().map(CandidateScore::rejection).collect(),
            floor,
        })
    }

    /// Renumber clusters by first member index and describe each one.
    fn build_clusters(
        &self,
        vectors: &[AggregatedVector],
        points: &[Point],
        raw: &[usize],
        standardizer: &Standardizer,
    ) -> (Vec<usize>, Vec<StyleCluster>) {
        let mut ids: Vec<usize> = Vec::new();
        let assignments: Vec<usize> = raw
            .iter()
            .map(|c| match ids.iter().position(|seen| seen == c) {
                Some(id) => id,
                None => {
                    ids.push(*c);
                    ids.len() - 1
                }
            })
            .collect();

        let clusters = (0..ids.len())
            .map(|id| {
                let members: Vec<usize> = assignments
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| **a == id)
                    .map(|(i, _)| i)
                    .collect();
                let standardized = member_mean(points, &members);
                StyleCluster {
                    id,
                    centroid: standardizer.inverse(&standardized),
                    standardized_centroid: standardized,
                    members: members
                        .iter()
                        .filter_map(|i| vectors.get(*i))
                        .map(|v| ClusterMember {
                            driver_id: v.driver_id.clone(),
                            context: v.context,
                        })
                        .collect(),
                    label: labels::label(
                        &standardized,
                        self.config.label_features,
                        self.config.balanced_threshold,
                    ),
                    description: labels::describe(&standardized),
                }
            })
            .collect();
        (assignments, clusters)
    }
}

/// Silhouette descending, ties toward the smaller k.
fn rank(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.silhouette
        .total_cmp(&a.silhouette)
        .then_with(|| a.k.cmp(&b.k))
}

fn member_mean(points: &[Point], members: &[usize]) -> Point {
    let mut mean = [0.0; FEATURE_COUNT];
    for point in members.iter().filter_map(|i| points.get(*i)) {
        for (m, x) in mean.iter_mut().zip(point) {
            *m += x;
        }
    }
    if !members.is_empty() {
        let n = members.len() as f64;
        for m in &mut mean {
            *m /= n;
        }
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(k: usize, silhouette: f64) -> CandidateScore {
        CandidateScore {
            k,
            silhouette,
            inertia: 0.0,
            non_empty_clusters: k,
        }
    }

    #[test]
    fn test_rank_prefers_higher_silhouette_then_smaller_k() {
        let mut scores = vec![score(4, 0.6), score(2, 0.4), score(3, 0.6)];
        scores.sort_by(rank);
        let ks: Vec<usize> = scores.iter().map(|s| s.k).collect();
        assert_eq!(ks, vec![3, 4, 2]);
    }

    #[test]
    fn test_validity_requires_two_clusters_and_floor() {
        assert!(score(2, 0.2).is_valid(0.1));
        assert!(!score(2, 0.05).is_valid(0.1));
        let collapsed = CandidateScore {
            non_empty_clusters: 1,
            ..score(3, 0.9)
        };
        assert!(!collapsed.is_valid(0.1));
    }

    #[test]
    fn test_member_mean() {
        let mut a = [0.0; FEATURE_COUNT];
        let mut b = [0.0; FEATURE_COUNT];
        if let (Some(x), Some(y)) = (a.first_mut(), b.first_mut()) {
            *x = 1.0;
            *y = 3.0;
        }
        let mean = member_mean(&[a, b, a], &[0, 1]);
        assert_eq!(mean.first().copied(), Some(2.0));
    }
}
