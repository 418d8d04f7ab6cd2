//! Population z-score standardization.

use driver_dna_contracts::stats::{mean, population_std};
use driver_dna_contracts::{DriverDnaVector, FEATURE_COUNT, FeatureId};
use serde::{Deserialize, Serialize};

/// A point in feature space.
pub type Point = [f64; FEATURE_COUNT];

/// Per-feature mean and scale fitted once over the whole population.
///
/// A feature with zero variance keeps scale 1, so it standardizes to 0
/// instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    means: Point,
    scales: Point,
}

impl Standardizer {
    /// Fit mean and population standard deviation per feature.
    pub fn fit<'a, I>(vectors: I) -> Self
    where
        I: IntoIterator<Item = &'a DriverDnaVector>,
    {
        let rows: Vec<&Point> = vectors.into_iter().map(DriverDnaVector::values).collect();
        let mut means = [0.0; FEATURE_COUNT];
        let mut scales = [1.0; FEATURE_COUNT];

        for (feature, (m, s)) in means.iter_mut().zip(scales.iter_mut()).enumerate() {
            let column: Vec<f64> = rows.iter().filter_map(|row| row.get(feature)).copied().collect();
            *m = mean(&column).unwrap_or_default();
            *s = match population_std(&column) {
                Some(std) if std > 0.0 && std.is_finite() => std,
                _ => 1.0,
            };
        }
        Self { means, scales }
    }

    /// Standardize one vector.
    pub fn transform(&self, vector: &DriverDnaVector) -> Point {
        self.transform_values(vector.values())
    }

    /// Standardize raw feature values.
    pub fn transform_values(&self, values: &Point) -> Point {
        let mut out = [0.0; FEATURE_COUNT];
        for (z, ((x, m), s)) in out
            .iter_mut()
            .zip(values.iter().zip(&self.means).zip(&self.scales))
        {
            *z = (x - m) / s;
        }
        out
    }

    /// Map a standardized point back to raw feature units.
    pub fn inverse(&self, point: &Point) -> Point {
        let mut out = [0.0; FEATURE_COUNT];
        for (x, ((z, m), s)) in out
            .iter_mut()
            .zip(point.iter().zip(&self.means).zip(&self.scales))
        {
            *x = z * s + m;
        }
        out
    }

    /// Population mean per feature.
    pub fn means(&self) -> &Point {
        &self.means
    }

    /// Scale per feature (population std, or 1 for constant features).
    pub fn scales(&self) -> &Point {
        &self.scales
    }

    /// Squared scale per feature, used to weight raw deltas.
    pub fn variances(&self) -> Point {
        self.scales.map(|s| s * s)
    }

    /// Scale of a single feature.
    pub fn scale(&self, feature: FeatureId) -> f64 {
        self.scales.get(feature.index()).copied().unwrap_or(1.0)
    }
}
