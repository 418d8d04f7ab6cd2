//! Run configuration for the driver DNA pipeline.
//!
//! There is no global or singleton configuration: a [`PipelineConfig`] is
//! built once (from defaults, YAML or JSON), validated, and passed
//! explicitly into each stage's entry point.
//!
//! The bundled defaults live in `default_config.yaml` and are embedded at
//! compile time.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod sections;
pub mod validation;

use std::path::Path;

use driver_dna_contracts::{Context, ContextDimension};
use driver_dna_errors::{DnaError, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use sections::{
    AggregatorConfig, ClusterConfig, ComparatorConfig, ExtractorConfig, NormalizerConfig,
    OutlierConfig,
};
pub use validation::{ConfigValidator, MAX_BIN_COUNT, MIN_BIN_COUNT};

/// Bundled default configuration.
pub const DEFAULT_CONFIG_YAML: &str = include_str!("default_config.yaml");

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Resampling settings
    pub normalizer: NormalizerConfig,
    /// Feature extraction thresholds
    pub extractor: ExtractorConfig,
    /// Lap-time outlier rejection
    pub outliers: OutlierConfig,
    /// Per-context aggregation
    pub aggregator: AggregatorConfig,
    /// Clustering
    pub cluster: ClusterConfig,
    /// Fingerprint comparison
    pub comparator: ComparatorConfig,
    /// Contexts every row reports a divergence against, when the driver has one.
    pub reference_contexts: Vec<Context>,
    /// Dimensions along which drivers are compared in the report.
    pub comparison_dimensions: Vec<ContextDimension>,
    /// Clustering seed; `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            extractor: ExtractorConfig::default(),
            outliers: OutlierConfig::default(),
            aggregator: AggregatorConfig::default(),
            cluster: ClusterConfig::default(),
            comparator: ComparatorConfig::default(),
            reference_contexts: Vec::new(),
            comparison_dimensions: ContextDimension::ALL.to_vec(),
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate the bundled defaults.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded YAML is broken.
    pub fn load_default() -> Result<Self, DnaError> {
        Self::from_yaml_str(DEFAULT_CONFIG_YAML)
    }

    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Config`] on parse failure and
    /// [`DnaError::Validation`] when a value is out of range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DnaError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| DnaError::config(format!("invalid YAML configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Config`] on parse failure and
    /// [`DnaError::Validation`] when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, DnaError> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| DnaError::config(format!("invalid JSON configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. `.json` files are read as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Io`] if the file cannot be read, otherwise see
    /// [`PipelineConfig::from_yaml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DnaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        debug!(path = %path.display(), is_json, "Loading pipeline configuration");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Config`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, DnaError> {
        serde_yaml::to_string(self)
            .map_err(|e| DnaError::config(format!("cannot serialize configuration: {e}")))
    }

    /// Check every value.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ConfigValidator::new().validate(self)
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_bundled_yaml_matches_default() -> TestResult {
        let loaded = PipelineConfig::load_default()?;
        assert_eq!(loaded, PipelineConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> TestResult {
        let config = PipelineConfig::from_yaml_str(
            "aggregator:\n  min_laps: 5\ncluster:\n  k_max: 4\nseed: 7\n",
        )?;
        assert_eq!(config.aggregator.min_laps, 5);
        assert_eq!(config.cluster.k_max, 4);
        assert_eq!(config.cluster.k_min, 2);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.normalizer, NormalizerConfig::default());
        Ok(())
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let result = PipelineConfig::from_yaml_str("normalizer:\n  bins: 10\n");
        assert!(matches!(result, Err(DnaError::Config(_))));
    }

    #[test]
    fn test_out_of_range_is_validation_error() {
        let result = PipelineConfig::from_yaml_str("aggregator:\n  min_laps: 0\n");
        assert!(matches!(result, Err(DnaError::Validation(_))));
    }

    #[test]
    fn test_reference_contexts_parse() -> TestResult {
        let config = PipelineConfig::from_yaml_str(
            "reference_contexts:\n  - track_type: high_speed\n    weather: dry\n    season: 2023\n",
        )?;
        assert_eq!(
            config.reference_contexts.first().map(ToString::to_string),
            Some("high_speed/dry/2023".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_yaml_roundtrip() -> TestResult {
        let config = PipelineConfig::default().with_seed(99);
        let yaml = config.to_yaml()?;
        assert_eq!(PipelineConfig::from_yaml_str(&yaml)?, config);
        Ok(())
    }
}
