//! Stage orchestration.

use std::collections::BTreeMap;

use driver_dna_aggregator::VectorAggregator;
use driver_dna_cluster::{ClusteringOutcome, StyleClusterer};
use driver_dna_config::PipelineConfig;
use driver_dna_contracts::{AggregatedVector, Context, DriverDnaVector, Lap, NamedFeatures};
use driver_dna_errors::{DataQualityError, DnaError, ResultExt, error_context};
use driver_dna_features::{ExclusionReason, FeatureExtractor, KeptLap, LapExclusion, OutlierFilter};
use driver_dna_fingerprint::{DriverAdaptability, FingerprintComparator};
use driver_dna_normalizer::TelemetryNormalizer;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::report::{ContextExclusion, PipelineReport};
use crate::table::{StyleRow, StyleTable};

type GroupKey = (String, Context);

/// The full driver DNA pipeline bound to one configuration.
#[derive(Debug, Clone)]
pub struct DnaPipeline {
    config: PipelineConfig,
    normalizer: TelemetryNormalizer,
    extractor: FeatureExtractor,
    filter: OutlierFilter,
    aggregator: VectorAggregator,
    clusterer: StyleClusterer,
    comparator: FingerprintComparator,
}

impl DnaPipeline {
    /// Build every stage from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Validation`] when the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, DnaError> {
        config.validate()?;
        Ok(Self {
            normalizer: TelemetryNormalizer::from_pipeline(&config),
            extractor: FeatureExtractor::from_pipeline(&config),
            filter: OutlierFilter::from_pipeline(&config),
            aggregator: VectorAggregator::from_pipeline(&config),
            clusterer: StyleClusterer::from_pipeline(&config),
            comparator: FingerprintComparator::from_pipeline(&config)?,
            config,
        })
    }

    /// Configuration of this pipeline.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `laps`.
    ///
    /// Lap and context failures are recorded in the report. Clustering
    /// falls back to the next-best k on its own.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::ClusteringConvergence`] when no cluster count is
    /// usable and [`DnaError::SchemaMismatch`] on a schema violation.
    pub fn run(&self, laps: &[Lap]) -> Result<PipelineReport, DnaError> {
        let seed = match self.config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                info!(seed, "No seed configured, drew a random seed");
                seed
            }
        };

        let partition = self.filter.partition(laps);
        let mut lap_exclusions = partition.excluded;
        let groups = self.extract_all(&partition.kept, &mut lap_exclusions);
        let (population, context_exclusions) = self.aggregate_all(&groups)?;

        let outcome = match self.clusterer.cluster(&population, seed) {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = DnaError::from(err);
                error!(
                    category = %err.category(),
                    severity = %err.severity(),
                    contexts = population.len(),
                    error = %err,
                    "Clustering failed"
                );
                return Err(err);
            }
        };
        let comparator = if self.config.comparator.scale_by_population {
            self.comparator
                .clone()
                .with_population_scales(&outcome.standardizer)
        } else {
            self.comparator.clone()
        };

        let table = self.style_table(&population, &outcome, &comparator, seed)?;
        let mut comparisons = BTreeMap::new();
        for dimension in &self.config.comparison_dimensions {
            let along = comparator
                .compare_across(&population, *dimension)
                .with_context(format!("compare along {dimension}"))?;
            comparisons.insert(*dimension, along);
        }
        let adaptability = adaptability(&table);

        info!(
            laps = laps.len(),
            excluded_laps = lap_exclusions.len(),
            contexts = population.len(),
            excluded_contexts = context_exclusions.len(),
            chosen_k = outcome.chosen_k,
            seed,
            "Driver DNA run complete"
        );

        Ok(PipelineReport {
            table,
            clusters: outcome.clusters,
            lap_exclusions,
            context_exclusions,
            candidates: outcome.candidates,
            fallbacks: outcome.fallbacks,
            comparisons,
            adaptability,
        })
    }

    /// Normalize and extract every kept lap in parallel, then group the
    /// vectors by (driver, context) in input order.
    fn extract_all(
        &self,
        kept: &[KeptLap<'_>],
        exclusions: &mut Vec<LapExclusion>,
    ) -> BTreeMap<GroupKey, Vec<DriverDnaVector>> {
        let results: Vec<(&Lap, Result<DriverDnaVector, DataQualityError>)> = kept
            .par_iter()
            .map(|k| {
                let vector = self
                    .normalizer
                    .normalize(k.lap)
                    .and_then(|matrix| self.extractor.extract(&matrix, k.personal_best_s));
                (k.lap, vector)
            })
            .collect();

        let mut groups: BTreeMap<GroupKey, Vec<DriverDnaVector>> = BTreeMap::new();
        for (lap, result) in results {
            match result {
                Ok(vector) => groups
                    .entry((lap.driver_id().to_string(), lap.context()))
                    .or_default()
                    .push(vector),
                Err(err) => {
                    debug!(lap = %lap.id(), error = %err, "Excluding lap");
                    exclusions.push(LapExclusion::new(lap, ExclusionReason::from(&err)));
                }
            }
        }
        groups
    }

    /// Aggregate every group in parallel. Groups below the minimum lap
    /// count are excluded; any other error aborts the run.
    fn aggregate_all(
        &self,
        groups: &BTreeMap<GroupKey, Vec<DriverDnaVector>>,
    ) -> Result<(Vec<AggregatedVector>, Vec<ContextExclusion>), DnaError> {
        let results: Vec<(&str, Context, Result<AggregatedVector, DnaError>)> = groups
            .par_iter()
            .map(|((driver, context), vectors)| {
                let result = self.aggregator.aggregate(driver, *context, vectors);
                (driver.as_str(), *context, result)
            })
            .collect();

        let mut population = Vec::with_capacity(results.len());
        let mut exclusions = Vec::new();
        for (driver, context, result) in results {
            match result {
                Ok(aggregated) => population.push(aggregated),
                Err(DnaError::InsufficientSample(err)) => {
                    warn!(
                        driver = %err.driver,
                        context = %context,
                        laps = err.laps,
                        required = err.required,
                        "Excluding context from clustering"
                    );
                    exclusions.push(ContextExclusion::new(context, &err));
                }
                Err(err) => {
                    return Err(err).context(error_context!(
                        "aggregate",
                        "driver" => driver,
                        "context" => context.to_string(),
                    ));
                }
            }
        }
        Ok((population, exclusions))
    }

    fn style_table(
        &self,
        population: &[AggregatedVector],
        outcome: &ClusteringOutcome,
        comparator: &FingerprintComparator,
        seed: u64,
    ) -> Result<StyleTable, DnaError> {
        let mut table = StyleTable::new(seed, outcome.chosen_k);
        for (index, aggregated) in population.iter().enumerate() {
            let cluster = outcome.cluster_of(index);
            let divergence = comparator
                .reference_divergences(aggregated, population, &self.config.reference_contexts)
                .context(error_context!(
                    "reference divergence",
                    "driver" => aggregated.driver_id.as_str(),
                    "context" => aggregated.context.to_string(),
                ))?;
            table.rows.push(StyleRow {
                driver_id: aggregated.driver_id.clone(),
                context: aggregated.context,
                lap_count: aggregated.lap_count,
                features: NamedFeatures::from(&aggregated.vector),
                cluster_id: cluster.map(|c| c.id).unwrap_or_default(),
                cluster_label: cluster.map(|c| c.label.clone()).unwrap_or_default(),
                divergence,
            });
        }
        Ok(table)
    }
}

/// Adaptability of every driver from the cluster ids of their rows.
fn adaptability(table: &StyleTable) -> Vec<DriverAdaptability> {
    let mut by_driver: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for row in &table.rows {
        by_driver.entry(&row.driver_id).or_default().push(row.cluster_id);
    }
    by_driver
        .into_iter()
        .map(|(driver, ids)| DriverAdaptability::new(driver, &ids))
        .collect()
}

/// Run the pipeline once with `config`.
///
/// # Errors
///
/// See [`DnaPipeline::new`] and [`DnaPipeline::run`].
pub fn run_pipeline(laps: &[Lap], config: &PipelineConfig) -> Result<PipelineReport, DnaError> {
    DnaPipeline::new(config.clone())?.run(laps)
}
