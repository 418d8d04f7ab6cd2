//! The style table handed to consumers of a run.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use driver_dna_contracts::{Context, FeatureId, NamedFeatures, SCHEMA_VERSION};
use driver_dna_errors::DnaError;
use serde::{Deserialize, Serialize};

/// One (driver, context) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRow {
    /// Driver code
    pub driver_id: String,
    /// Grouping context
    pub context: Context,
    /// Laps aggregated into the row
    pub lap_count: usize,
    /// Feature values in schema order
    pub features: NamedFeatures,
    /// Style cluster id
    pub cluster_id: usize,
    /// Style cluster label
    pub cluster_label: String,
    /// Divergence from each reference context, keyed by its display form
    pub divergence: BTreeMap<String, f64>,
}

/// Output of a pipeline run, rows sorted by (driver, context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    /// Feature schema version
    pub schema_version: u16,
    /// Feature names in schema order
    pub feature_names: Vec<String>,
    /// Seed the run used
    pub seed: u64,
    /// Number of clusters chosen
    pub chosen_k: usize,
    /// Rows
    pub rows: Vec<StyleRow>,
}

impl StyleTable {
    /// Empty table for the current schema.
    pub fn new(seed: u64, chosen_k: usize) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            feature_names: FeatureId::ALL.iter().map(|f| f.name().to_string()).collect(),
            seed,
            chosen_k,
            rows: Vec::new(),
        }
    }

    /// Row of a driver in a context.
    pub fn row(&self, driver_id: &str, context: Context) -> Option<&StyleRow> {
        self.rows
            .iter()
            .find(|r| r.driver_id == driver_id && r.context == context)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Other`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, DnaError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DnaError::other(format!("Failed to serialize style table: {e}")))
    }

    /// Parse a table written by [`StyleTable::write_json`].
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Other`] on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, DnaError> {
        serde_json::from_str(json)
            .map_err(|e| DnaError::other(format!("Failed to parse style table: {e}")))
    }

    /// Write the table as pretty-printed JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DnaError::Io`] when the file cannot be written.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DnaError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| DnaError::other(format!("Failed to serialize style table: {e}")))?;
        writer.flush()?;
        Ok(())
    }
}
