//! Partitioning algorithms.
//!
//! [`KMeans`] is Lloyd's algorithm with k-means++ seeding and several
//! restarts. Every restart draws from its own ChaCha8 stream seeded with
//! `seed + restart`, so a run is reproducible from the caller's seed alone.

use driver_dna_config::ClusterConfig;
use driver_dna_contracts::FEATURE_COUNT;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::standardize::Point;

/// One partition of a point set into `k` clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Cluster index per input point
    pub assignments: Vec<usize>,
    /// Cluster centroids, `k` of them
    pub centroids: Vec<Point>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
}

impl Partition {
    /// Number of clusters with at least one member.
    pub fn non_empty_clusters(&self) -> usize {
        let mut seen = vec![false; self.centroids.len()];
        for &cluster in &self.assignments {
            if let Some(slot) = seen.get_mut(cluster) {
                *slot = true;
            }
        }
        seen.into_iter().filter(|s| *s).count()
    }
}

/// An unsupervised partitioning method.
pub trait PartitionAlgorithm {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Split `points` into `k` clusters. Must be deterministic in `seed`.
    fn partition(&self, points: &[Point], k: usize, seed: u64) -> Partition;
}

/// Seeded k-means.
#[derive(Debug, Clone)]
pub struct KMeans {
    n_init: usize,
    max_iterations: usize,
    tolerance: f64,
}

impl KMeans {
    /// Create from the clustering configuration.
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            n_init: config.n_init.max(1),
            max_iterations: config.max_iterations.max(1),
            tolerance: config.tolerance,
        }
    }

    fn run_once(&self, points: &[Point], k: usize, rng: &mut ChaCha8Rng) -> Partition {
        let mut centroids = plus_plus_init(points, k, rng);
        let mut assignments = vec![0; points.len()];

        for iteration in 0..self.max_iterations {
            assign(points, &centroids, &mut assignments);
            let mut next = update_centroids(points, &assignments, &centroids);
            reseed_empty(points, &mut assignments, &mut next);

            let shift = centroids
                .iter()
                .zip(&next)
                .map(|(a, b)| squared_distance(a, b).sqrt())
                .fold(0.0, f64::max);
            centroids = next;
            if shift < self.tolerance {
                trace!(iteration, shift, "k-means converged");
                break;
            }
        }

        assign(points, &centroids, &mut assignments);
        let inertia = points
            .iter()
            .zip(&assignments)
            .filter_map(|(p, &c)| centroids.get(c).map(|centroid| squared_distance(p, centroid)))
            .sum();
        Partition {
            assignments,
            centroids,
            inertia,
        }
    }
}

impl PartitionAlgorithm for KMeans {
    fn name(&self) -> &'static str {
        "k-means"
    }

    fn partition(&self, points: &[Point], k: usize, seed: u64) -> Partition {
        let k = k.clamp(1, points.len().max(1));
        let mut best: Option<Partition> = None;

        for restart in 0..self.n_init {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(restart as u64));
            let candidate = self.run_once(points, k, &mut rng);
            trace!(k, restart, inertia = candidate.inertia, "k-means restart");
            if best.as_ref().is_none_or(|b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }

        best.unwrap_or_else(|| Partition {
            assignments: vec![0; points.len()],
            centroids: Vec::new(),
            inertia: 0.0,
        })
    }
}

/// Squared Euclidean distance.
pub fn squared_distance(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance.
pub fn distance(a: &Point, b: &Point) -> f64 {
    squared_distance(a, b).sqrt()
}

/// k-means++: first centre uniform, later ones proportional to D².
fn plus_plus_init(points: &[Point], k: usize, rng: &mut ChaCha8Rng) -> Vec<Point> {
    let mut centroids: Vec<Point> = Vec::with_capacity(k);
    let Some(first) = points.get(rng.random_range(0..points.len().max(1))) else {
        return centroids;
    };
    centroids.push(*first);

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| nearest(p, &centroids).1)
            .collect();
        let total: f64 = weights.iter().sum();

        let chosen = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            weights
                .iter()
                .position(|w| {
                    target -= w;
                    target < 0.0
                })
                .or_else(|| weights.iter().rposition(|w| *w > 0.0))
        } else {
            // every point sits on a centre already
            Some(rng.random_range(0..points.len()))
        };

        match chosen.and_then(|i| points.get(i)) {
            Some(point) => centroids.push(*point),
            None => break,
        }
    }
    centroids
}

/// Index of the closest centroid and the squared distance to it. Ties go
/// to the lower index.
fn nearest(point: &Point, centroids: &[Point]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

fn assign(points: &[Point], centroids: &[Point], assignments: &mut [usize]) {
    for (slot, point) in assignments.iter_mut().zip(points) {
        *slot = nearest(point, centroids).0;
    }
}

/// Member means. A cluster without members keeps its previous centroid
/// until [`reseed_empty`] moves it.
fn update_centroids(points: &[Point], assignments: &[usize], previous: &[Point]) -> Vec<Point> {
    let mut sums = vec![[0.0; FEATURE_COUNT]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (point, &cluster) in points.iter().zip(assignments) {
        if let (Some(sum), Some(count)) = (sums.get_mut(cluster), counts.get_mut(cluster)) {
            for (s, x) in sum.iter_mut().zip(point) {
                *s += x;
            }
            *count += 1;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                *prev
            } else {
                sum.map(|s| s / count as f64)
            }
        })
        .collect()
}

/// Move every empty cluster onto the point farthest from its own centroid,
/// taking that point from a cluster that keeps at least one member.
fn reseed_empty(points: &[Point], assignments: &mut [usize], centroids: &mut [Point]) {
    let k = centroids.len();
    loop {
        let mut counts = vec![0usize; k];
        for &c in assignments.iter() {
            if let Some(count) = counts.get_mut(c) {
                *count += 1;
            }
        }
        let Some(empty) = counts.iter().position(|&n| n == 0) else {
            return;
        };

        let farthest = points
            .iter()
            .zip(assignments.iter())
            .enumerate()
            .filter(|(_, (_, c))| counts.get(**c).is_some_and(|&n| n > 1))
            .filter_map(|(i, (p, c))| centroids.get(*c).map(|centroid| (i, squared_distance(p, centroid))))
            .fold(None, |best: Option<(usize, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });

        let Some((index, _)) = farthest else {
            return;
        };
        if let (Some(point), Some(slot), Some(centroid)) = (
            points.get(index),
            assignments.get_mut(index),
            centroids.get_mut(empty),
        ) {
            *centroid = *point;
            *slot = empty;
        } else {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Point {
        let mut p = [0.0; FEATURE_COUNT];
        if let [a, b, ..] = &mut p {
            *a = x;
            *b = y;
        }
        p
    }

    fn two_blobs() -> Vec<Point> {
        vec![
            point(0.0, 0.0),
            point(0.1, 0.0),
            point(0.0, 0.1),
            point(10.0, 10.0),
            point(10.1, 10.0),
            point(10.0, 10.1),
        ]
    }

    fn kmeans() -> KMeans {
        KMeans::new(&ClusterConfig::default())
    }

    #[test]
    fn test_separates_two_blobs() {
        let partition = kmeans().partition(&two_blobs(), 2, 42);
        let (left, right) = partition.assignments.split_at(3);
        assert!(left.iter().all(|c| Some(c) == left.first()));
        assert!(right.iter().all(|c| Some(c) == right.first()));
        assert_ne!(left.first(), right.first());
        assert!(partition.inertia < 0.1);
        assert_eq!(partition.non_empty_clusters(), 2);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = kmeans().partition(&two_blobs(), 3, 7);
        let b = kmeans().partition(&two_blobs(), 3, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_points_do_not_leave_empty_clusters() {
        let points = vec![point(1.0, 1.0); 4];
        let partition = kmeans().partition(&points, 3, 1);
        assert_eq!(partition.centroids.len(), 3);
        assert!(partition.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_reseed_takes_farthest_point() {
        let points = vec![point(0.0, 0.0), point(1.0, 0.0), point(9.0, 0.0)];
        let mut assignments = vec![0, 0, 0];
        let mut centroids = vec![point(0.0, 0.0), point(50.0, 50.0)];
        reseed_empty(&points, &mut assignments, &mut centroids);
        assert_eq!(assignments, vec![0, 0, 1]);
        assert_eq!(centroids.get(1), Some(&point(9.0, 0.0)));
    }

    #[test]
    fn test_nearest_prefers_lower_index_on_tie() {
        let centroids = [point(-1.0, 0.0), point(1.0, 0.0)];
        assert_eq!(nearest(&point(0.0, 0.0), &centroids).0, 0);
    }
}
