//! Weighted fingerprint comparison between two contexts of one driver.

use core::fmt;
use std::collections::BTreeMap;

use driver_dna_cluster::Standardizer;
use driver_dna_config::{ComparatorConfig, PipelineConfig};
use driver_dna_contracts::{AggregatedVector, Context, ContextDimension, DriverDnaVector, FEATURE_COUNT};
use driver_dna_errors::{SchemaMismatchError, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Z-scores are clipped to this magnitude for trait stability.
pub const Z_CLIP: f64 = 3.0;

/// Whether a driver's style moved between two contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Divergence above the adaptation threshold
    Adapted,
    /// Divergence at or below the adaptation threshold
    Consistent,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Adapted => f.write_str("adapted"),
            Classification::Consistent => f.write_str("consistent"),
        }
    }
}

/// Comparison of one driver's vectors in two contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintComparison {
    /// Driver code
    pub driver_id: String,
    /// Baseline context
    pub context_a: Context,
    /// Compared context
    pub context_b: Context,
    /// Per-feature `b - a`
    pub deltas: DriverDnaVector,
    /// Weighted Euclidean distance
    pub divergence: f64,
    /// Adapted or consistent
    pub classification: Classification,
    /// 0..=100, present when population scales are known
    pub trait_stability: Option<f64>,
}

/// Compares fingerprints with configured feature weights.
#[derive(Debug, Clone)]
pub struct FingerprintComparator {
    weights: [f64; FEATURE_COUNT],
    adaptation_threshold: f64,
    population: Option<Standardizer>,
}

impl Default for FingerprintComparator {
    fn default() -> Self {
        Self {
            weights: [1.0; FEATURE_COUNT],
            adaptation_threshold: ComparatorConfig::default().adaptation_threshold,
            population: None,
        }
    }
}

impl FingerprintComparator {
    /// Create a comparator from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a weight on an unknown feature.
    pub fn new(config: &ComparatorConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            weights: config.weight_vector()?,
            adaptation_threshold: config.adaptation_threshold,
            population: None,
        })
    }

    /// Create a comparator from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// See [`FingerprintComparator::new`].
    pub fn from_pipeline(config: &PipelineConfig) -> Result<Self, ValidationError> {
        Self::new(&config.comparator)
    }

    /// Divide every weight by the population variance of its feature and
    /// enable trait stability.
    pub fn with_population_scales(mut self, standardizer: &Standardizer) -> Self {
        for (weight, variance) in self.weights.iter_mut().zip(standardizer.variances()) {
            *weight /= variance;
        }
        self.population = Some(standardizer.clone());
        self
    }

    /// Effective per-feature weights.
    pub fn weights(&self) -> &[f64; FEATURE_COUNT] {
        &self.weights
    }

    /// `sqrt(Σ wᵢ·δᵢ²)` over a delta vector.
    pub fn divergence_of(&self, deltas: &DriverDnaVector) -> f64 {
        self.weights
            .iter()
            .zip(deltas.values())
            .map(|(w, d)| w * d * d)
            .sum::<f64>()
            .sqrt()
    }

    /// Compare the fingerprints of one driver in two contexts.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatchError::DriverMismatch`] when the vectors
    /// belong to different drivers and
    /// [`SchemaMismatchError::VersionMismatch`] when their schemas differ.
    pub fn compare(
        &self,
        a: &AggregatedVector,
        b: &AggregatedVector,
    ) -> Result<FingerprintComparison, SchemaMismatchError> {
        if a.driver_id != b.driver_id {
            return Err(SchemaMismatchError::DriverMismatch {
                left: a.driver_id.clone(),
                right: b.driver_id.clone(),
            });
        }
        let deltas = a.vector.zip_with(&b.vector, |x, y| y - x)?;
        let divergence = self.divergence_of(&deltas);
        let classification = if divergence > self.adaptation_threshold {
            Classification::Adapted
        } else {
            Classification::Consistent
        };
        let trait_stability = self
            .population
            .as_ref()
            .map(|population| trait_stability(population, &a.vector, &b.vector));

        trace!(
            driver = %a.driver_id,
            from = %a.context,
            to = %b.context,
            divergence,
            %classification,
            "Compared fingerprints"
        );
        Ok(FingerprintComparison {
            driver_id: a.driver_id.clone(),
            context_a: a.context,
            context_b: b.context,
            deltas,
            divergence,
            classification,
            trait_stability,
        })
    }

    /// Compare every pair of a driver's contexts that differ only in
    /// `dimension`. Output is ordered by driver, then by context pair.
    ///
    /// # Errors
    ///
    /// Propagates the first schema mismatch.
    pub fn compare_across(
        &self,
        population: &[AggregatedVector],
        dimension: ContextDimension,
    ) -> Result<Vec<FingerprintComparison>, SchemaMismatchError> {
        let mut by_driver: BTreeMap<&str, Vec<&AggregatedVector>> = BTreeMap::new();
        for vector in population {
            by_driver.entry(&vector.driver_id).or_default().push(vector);
        }

        let mut comparisons = Vec::new();
        for vectors in by_driver.values_mut() {
            vectors.sort_by_key(|v| v.context);
            for (i, a) in vectors.iter().enumerate() {
                for b in vectors.iter().skip(i + 1) {
                    if a.context.differs_only_in(&b.context, dimension) {
                        comparisons.push(self.compare(a, b)?);
                    }
                }
            }
        }
        Ok(comparisons)
    }

    /// Divergence of `row` from the same driver's vector in each reference
    /// context, keyed by the reference context display form.
    ///
    /// References equal to the row's own context, or where the driver has
    /// no vector, are skipped.
    ///
    /// # Errors
    ///
    /// Propagates schema mismatches.
    pub fn reference_divergences(
        &self,
        row: &AggregatedVector,
        population: &[AggregatedVector],
        references: &[Context],
    ) -> Result<BTreeMap<String, f64>, SchemaMismatchError> {
        let mut out = BTreeMap::new();
        for reference in references.iter().filter(|r| **r != row.context) {
            if let Some(baseline) = population
                .iter()
                .find(|v| v.driver_id == row.driver_id && v.context == *reference)
            {
                let comparison = self.compare(baseline, row)?;
                out.insert(reference.to_string(), comparison.divergence);
            }
        }
        Ok(out)
    }
}

/// `100 - mean(|Δz|) / (2·Z_CLIP) · 100` with z-scores clipped to ±[`Z_CLIP`].
pub fn trait_stability(population: &Standardizer, a: &DriverDnaVector, b: &DriverDnaVector) -> f64 {
    let za = population.transform(a);
    let zb = population.transform(b);
    let mean_abs = za
        .iter()
        .zip(&zb)
        .map(|(x, y)| (x.clamp(-Z_CLIP, Z_CLIP) - y.clamp(-Z_CLIP, Z_CLIP)).abs())
        .sum::<f64>()
        / FEATURE_COUNT as f64;
    100.0 - mean_abs / (2.0 * Z_CLIP) * 100.0
}

/// Compare with unit weights and the default adaptation threshold.
///
/// # Errors
///
/// See [`FingerprintComparator::compare`].
pub fn compare_fingerprint(
    a: &AggregatedVector,
    b: &AggregatedVector,
) -> Result<FingerprintComparison, SchemaMismatchError> {
    FingerprintComparator::default().compare(a, b)
}
