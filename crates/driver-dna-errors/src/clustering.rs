//! Clustering convergence errors.

use core::fmt;

use crate::common::ErrorSeverity;

/// Why a single candidate cluster count was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRejection {
    /// Candidate cluster count
    pub k: usize,
    /// Mean silhouette coefficient of the candidate partition
    pub silhouette: f64,
    /// Number of clusters that ended up with at least one member
    pub non_empty_clusters: usize,
}

impl fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k={} (silhouette {:.3}, {} non-empty)",
            self.k, self.silhouette, self.non_empty_clusters
        )
    }
}

/// No candidate cluster count produced a usable partition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusteringConvergenceError {
    /// Population too small for a silhouette score
    #[error("Clustering needs at least {required} vectors, got {count}")]
    TooFewVectors {
        /// Vectors supplied
        count: usize,
        /// Minimum population
        required: usize,
    },

    /// The requested k range has no value in `2..=n-1`
    #[error("No feasible cluster count in {k_min}..={k_max} for {count} vectors")]
    NoFeasibleK {
        /// Lower bound requested
        k_min: usize,
        /// Upper bound requested
        k_max: usize,
        /// Vectors supplied
        count: usize,
    },

    /// A single candidate collapsed or scored below the floor
    #[error("Candidate {candidate} is degenerate (floor: {floor})")]
    Degenerate {
        /// The rejected candidate
        candidate: CandidateRejection,
        /// Configured validity floor
        floor: f64,
    },

    /// Every candidate was degenerate
    #[error("All cluster candidates rejected (floor: {floor}): {}", join(.candidates))]
    AllCandidatesRejected {
        /// Candidates in the order they were tried
        candidates: Vec<CandidateRejection>,
        /// Configured validity floor
        floor: f64,
    },
}

fn join(candidates: &[CandidateRejection]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ClusteringConvergenceError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }
}
