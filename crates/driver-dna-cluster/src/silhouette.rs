//! Mean silhouette coefficient.

use crate::kmeans::distance;
use crate::standardize::Point;

/// Mean silhouette over all points, in `[-1, 1]`.
///
/// A point alone in its cluster scores 0. Fewer than two non-empty
/// clusters give 0 as well, since no neighbouring cluster exists.
pub fn mean_silhouette(points: &[Point], assignments: &[usize], k: usize) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let scores: Vec<f64> = points
        .iter()
        .zip(assignments)
        .enumerate()
        .map(|(i, (point, &own))| point_silhouette(i, point, own, points, assignments, k))
        .collect();
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn point_silhouette(
    index: usize,
    point: &Point,
    own: usize,
    points: &[Point],
    assignments: &[usize],
    k: usize,
) -> f64 {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];
    for (j, (other, &cluster)) in points.iter().zip(assignments).enumerate() {
        if j == index {
            continue;
        }
        if let (Some(sum), Some(count)) = (sums.get_mut(cluster), counts.get_mut(cluster)) {
            *sum += distance(point, other);
            *count += 1;
        }
    }

    let a = match (sums.get(own), counts.get(own)) {
        (Some(sum), Some(&count)) if count > 0 => sum / count as f64,
        _ => return 0.0,
    };
    let b = sums
        .iter()
        .zip(&counts)
        .enumerate()
        .filter(|(cluster, (_, count))| *cluster != own && **count > 0)
        .map(|(_, (sum, &count))| sum / count as f64)
        .fold(f64::INFINITY, f64::min);
    if !b.is_finite() {
        return 0.0;
    }

    let denom = a.max(b);
    if denom > 0.0 { (b - a) / denom } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_dna_contracts::FEATURE_COUNT;

    fn point(x: f64) -> Point {
        let mut p = [0.0; FEATURE_COUNT];
        if let Some(first) = p.first_mut() {
            *first = x;
        }
        p
    }

    #[test]
    fn test_well_separated_is_near_one() {
        let points = [point(0.0), point(0.1), point(10.0), point(10.1)];
        let s = mean_silhouette(&points, &[0, 0, 1, 1], 2);
        assert!(s > 0.95, "silhouette {s}");
    }

    #[test]
    fn test_hand_computed_value() {
        // a = 1, b = mean(4, 5) = 4.5 for the first point
        let points = [point(0.0), point(1.0), point(4.0), point(5.0)];
        let s = mean_silhouette(&points, &[0, 0, 1, 1], 2);
        let expected = [(4.5 - 1.0) / 4.5, (3.5 - 1.0) / 3.5, (3.5 - 1.0) / 3.5, (4.5 - 1.0) / 4.5];
        let expected = expected.iter().sum::<f64>() / 4.0;
        assert!((s - expected).abs() < 1e-12);
    }

    #[test]
    fn test_singleton_scores_zero() {
        let points = [point(0.0), point(0.1), point(10.0)];
        let with_singleton = mean_silhouette(&points, &[0, 0, 1], 2);
        // the two paired points score close to 1, the singleton 0
        assert!(with_singleton < 0.7);
        assert!(with_singleton > 0.6);
    }

    #[test]
    fn test_single_cluster_scores_zero() {
        let points = [point(0.0), point(1.0), point(2.0)];
        assert!(mean_silhouette(&points, &[0, 0, 0], 2).abs() < f64::EPSILON);
    }
}
