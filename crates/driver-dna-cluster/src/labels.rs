//! Human-readable cluster labels.

use driver_dna_contracts::FeatureId;

use crate::standardize::Point;

/// Label used when no feature stands out.
pub const BALANCED_LABEL: &str = "Balanced";

/// Features of a standardized centroid ordered by |z|, largest first.
/// Equal magnitudes keep schema order.
fn ranked(centroid: &Point) -> Vec<(FeatureId, f64)> {
    let mut ranked: Vec<(FeatureId, f64)> = FeatureId::ALL
        .into_iter()
        .zip(centroid.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    ranked
}

/// Trait-phrase label for a standardized centroid, e.g.
/// `"Late Braking / Smooth Throttle"`.
pub fn label(centroid: &Point, label_features: usize, balanced_threshold: f64) -> String {
    let phrases: Vec<&str> = ranked(centroid)
        .into_iter()
        .take(label_features)
        .filter(|(_, z)| z.abs() >= balanced_threshold)
        .map(|(feature, z)| {
            let (high, low) = feature.trait_phrases();
            if z > 0.0 { high } else { low }
        })
        .collect();

    if phrases.is_empty() {
        BALANCED_LABEL.to_string()
    } else {
        phrases.join(" / ")
    }
}

/// The three most distinctive features with their z-scores.
pub fn describe(centroid: &Point) -> String {
    ranked(centroid)
        .into_iter()
        .take(3)
        .map(|(feature, z)| {
            let direction = if z > 0.0 { "High" } else { "Low" };
            format!("{direction} {} ({z:+.2})", feature.name().replace('_', " "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_dna_contracts::FEATURE_COUNT;

    fn centroid(entries: &[(FeatureId, f64)]) -> Point {
        let mut point = [0.0; FEATURE_COUNT];
        for (feature, z) in entries {
            if let Some(slot) = point.get_mut(feature.index()) {
                *slot = *z;
            }
        }
        point
    }

    #[test]
    fn test_top_two_features_name_the_style() {
        let c = centroid(&[
            (FeatureId::BrakeOnsetDistance, -1.8),
            (FeatureId::ThrottleSmoothness, -1.2),
            (FeatureId::GearChangeRate, 0.6),
        ]);
        assert_eq!(label(&c, 2, 0.5), "Late Braking / Smooth Throttle");
    }

    #[test]
    fn test_small_deviations_are_balanced() {
        let c = centroid(&[(FeatureId::PeakDeceleration, 0.3), (FeatureId::LapPaceRatio, -0.2)]);
        assert_eq!(label(&c, 2, 0.5), BALANCED_LABEL);
    }

    #[test]
    fn test_only_features_above_threshold_are_named() {
        let c = centroid(&[(FeatureId::PeakDeceleration, 1.4), (FeatureId::LapPaceRatio, 0.1)]);
        assert_eq!(label(&c, 2, 0.5), "Aggressive Braking");
    }

    #[test]
    fn test_description() {
        let c = centroid(&[
            (FeatureId::BrakeOnsetVariance, 2.0),
            (FeatureId::PeakDeceleration, -1.25),
            (FeatureId::SpeedVariability, 0.5),
        ]);
        insta::assert_snapshot!(
            describe(&c),
            @"High brake onset variance (+2.00), Low peak deceleration (-1.25), High speed variability (+0.50)"
        );
    }
}
