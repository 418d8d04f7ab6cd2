//! Style vectors.
//!
//! [`DriverDnaVector`] stores its values in a fixed-size array indexed by
//! [`FeatureId`], so dimensionality is a compile-time property. Vectors
//! built from runtime data (slices, name/value pairs, JSON) are validated
//! at construction and fail with [`SchemaMismatchError`].

use core::fmt;

use driver_dna_errors::SchemaMismatchError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::Context;
use crate::features::{FEATURE_COUNT, FeatureId, SCHEMA_VERSION};

/// Fixed-length, named style descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VectorRepr", into = "VectorRepr")]
pub struct DriverDnaVector {
    schema_version: u16,
    values: [f64; FEATURE_COUNT],
}

impl DriverDnaVector {
    /// Build a vector for the current schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatchError::NonFiniteFeature`] if any value is
    /// NaN or infinite.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, SchemaMismatchError> {
        if let Some((feature, value)) = FeatureId::ALL
            .into_iter()
            .zip(values)
            .find(|(_, v)| !v.is_finite())
        {
            return Err(SchemaMismatchError::NonFiniteFeature {
                feature: feature.name().to_string(),
                value,
            });
        }
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            values,
        })
    }

    /// Vector with every feature set to zero.
    pub const fn zeros() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            values: [0.0; FEATURE_COUNT],
        }
    }

    /// Build a vector from a slice in schema order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatchError::DimensionMismatch`] when the slice
    /// length differs from [`FEATURE_COUNT`], or a non-finite error.
    pub fn from_slice(values: &[f64]) -> Result<Self, SchemaMismatchError> {
        let array: [f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| SchemaMismatchError::DimensionMismatch {
                    expected: FEATURE_COUNT,
                    actual: values.len(),
                })?;
        Self::new(array)
    }

    /// Build a vector from `(name, value)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Fails on unknown, duplicate or missing feature names and on
    /// non-finite values.
    pub fn from_named<I, S>(pairs: I) -> Result<Self, SchemaMismatchError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut slots: [Option<f64>; FEATURE_COUNT] = [None; FEATURE_COUNT];
        for (name, value) in pairs {
            let name = name.as_ref();
            let feature = FeatureId::from_name(name)
                .ok_or_else(|| SchemaMismatchError::UnknownFeature(name.to_string()))?;
            let slot = slots
                .get_mut(feature.index())
                .ok_or_else(|| SchemaMismatchError::UnknownFeature(name.to_string()))?;
            if slot.replace(value).is_some() {
                return Err(SchemaMismatchError::DuplicateFeature(name.to_string()));
            }
        }

        let mut values = [0.0; FEATURE_COUNT];
        for ((out, slot), feature) in values.iter_mut().zip(slots).zip(FeatureId::ALL) {
            *out = slot
                .ok_or_else(|| SchemaMismatchError::MissingFeature(feature.name().to_string()))?;
        }
        Self::new(values)
    }

    /// Schema version this vector was produced under.
    pub fn schema_version(&self) -> u16 {
        self.schema_version
    }

    /// Check that this vector follows the schema of this build.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatchError::VersionMismatch`] otherwise.
    pub fn check_schema(&self) -> Result<(), SchemaMismatchError> {
        if self.schema_version == SCHEMA_VERSION {
            Ok(())
        } else {
            Err(SchemaMismatchError::VersionMismatch {
                expected: SCHEMA_VERSION,
                actual: self.schema_version,
            })
        }
    }

    /// Check that two vectors can be compared or combined.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatchError::VersionMismatch`] when versions differ.
    pub fn check_compatible(&self, other: &DriverDnaVector) -> Result<(), SchemaMismatchError> {
        if self.schema_version == other.schema_version {
            Ok(())
        } else {
            Err(SchemaMismatchError::VersionMismatch {
                expected: self.schema_version,
                actual: other.schema_version,
            })
        }
    }

    /// Value of one feature.
    #[expect(
        clippy::indexing_slicing,
        reason = "FeatureId::index is always below FEATURE_COUNT"
    )]
    pub fn get(&self, feature: FeatureId) -> f64 {
        self.values[feature.index()]
    }

    /// All values in schema order.
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Iterate `(feature, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        FeatureId::ALL.into_iter().zip(self.values.iter().copied())
    }

    /// `(name, value)` pairs in schema order.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        self.iter().map(|(f, v)| (f.name(), v)).collect()
    }

    /// Element-wise combination with another vector of the same schema.
    ///
    /// # Errors
    ///
    /// Fails on schema mismatch or when `op` produces a non-finite value.
    pub fn zip_with(
        &self,
        other: &DriverDnaVector,
        mut op: impl FnMut(f64, f64) -> f64,
    ) -> Result<DriverDnaVector, SchemaMismatchError> {
        self.check_compatible(other)?;
        let mut values = [0.0; FEATURE_COUNT];
        for (out, (a, b)) in values
            .iter_mut()
            .zip(self.values.iter().zip(other.values.iter()))
        {
            *out = op(*a, *b);
        }
        let mut combined = DriverDnaVector::new(values)?;
        combined.schema_version = self.schema_version;
        Ok(combined)
    }
}

impl Default for DriverDnaVector {
    fn default() -> Self {
        Self::zeros()
    }
}

impl fmt::Display for DriverDnaVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}[", self.schema_version)?;
        for (i, (feature, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{feature}={value:.4}")?;
        }
        write!(f, "]")
    }
}

/// Serialized form: version plus a name → value map in schema order.
#[derive(Serialize, Deserialize)]
struct VectorRepr {
    schema_version: u16,
    features: NamedFeatures,
}

impl From<DriverDnaVector> for VectorRepr {
    fn from(vector: DriverDnaVector) -> Self {
        VectorRepr {
            schema_version: vector.schema_version,
            features: NamedFeatures::from(&vector),
        }
    }
}

impl TryFrom<VectorRepr> for DriverDnaVector {
    type Error = SchemaMismatchError;

    fn try_from(repr: VectorRepr) -> Result<Self, Self::Error> {
        let mut vector = DriverDnaVector::from_named(repr.features.0)?;
        vector.schema_version = repr.schema_version;
        vector.check_schema()?;
        Ok(vector)
    }
}

/// Feature name to value map that keeps schema order on both serialize
/// and deserialize.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedFeatures(pub Vec<(String, f64)>);

impl NamedFeatures {
    /// Value of the feature called `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

impl From<&DriverDnaVector> for NamedFeatures {
    fn from(vector: &DriverDnaVector) -> Self {
        NamedFeatures(
            vector
                .iter()
                .map(|(f, v)| (f.name().to_string(), v))
                .collect(),
        )
    }
}

impl Serialize for NamedFeatures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NamedFeatures {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedFeaturesVisitor;

        impl<'de> Visitor<'de> for NamedFeaturesVisitor {
            type Value = NamedFeatures;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature name to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NamedFeatures, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(FEATURE_COUNT));
                while let Some((name, value)) = access.next_entry::<String, f64>()? {
                    entries.push((name, value));
                }
                Ok(NamedFeatures(entries))
            }
        }

        deserializer.deserialize_map(NamedFeaturesVisitor)
    }
}

/// One style vector per (driver, context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedVector {
    /// Driver code
    pub driver_id: String,
    /// Grouping context
    pub context: Context,
    /// Representative style vector
    pub vector: DriverDnaVector,
    /// Laps that contributed
    pub lap_count: usize,
}

impl AggregatedVector {
    /// `(driver, context)` key of this vector.
    pub fn key(&self) -> (&str, Context) {
        (&self.driver_id, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn sample_values() -> [f64; FEATURE_COUNT] {
        let mut values = [0.0; FEATURE_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as f64 * 1.5;
        }
        values
    }

    #[test]
    fn test_from_slice_checks_length() {
        let short = [1.0; 5];
        assert_eq!(
            DriverDnaVector::from_slice(&short),
            Err(SchemaMismatchError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: 5
            })
        );
    }

    #[test]
    fn test_new_rejects_nan() {
        let mut values = sample_values();
        values[3] = f64::NAN;
        assert!(matches!(
            DriverDnaVector::new(values),
            Err(SchemaMismatchError::NonFiniteFeature { .. })
        ));
    }

    #[test]
    fn test_from_named_any_order() -> TestResult {
        let original = DriverDnaVector::new(sample_values())?;
        let mut pairs = original.named();
        pairs.reverse();
        let rebuilt = DriverDnaVector::from_named(pairs)?;
        assert_eq!(rebuilt, original);
        Ok(())
    }

    #[test]
    fn test_from_named_rejects_bad_names() -> TestResult {
        let original = DriverDnaVector::new(sample_values())?;

        let mut unknown = original.named();
        unknown.push(("grip", 1.0));
        assert_eq!(
            DriverDnaVector::from_named(unknown),
            Err(SchemaMismatchError::UnknownFeature("grip".into()))
        );

        let mut duplicate = original.named();
        duplicate.push(("gear_change_rate", 2.0));
        assert_eq!(
            DriverDnaVector::from_named(duplicate),
            Err(SchemaMismatchError::DuplicateFeature("gear_change_rate".into()))
        );

        let missing: Vec<_> = original
            .named()
            .into_iter()
            .filter(|(name, _)| *name != "lap_pace_ratio")
            .collect();
        assert_eq!(
            DriverDnaVector::from_named(missing),
            Err(SchemaMismatchError::MissingFeature("lap_pace_ratio".into()))
        );
        Ok(())
    }

    #[test]
    fn test_json_uses_feature_names_in_schema_order() -> TestResult {
        let vector = DriverDnaVector::new(sample_values())?;
        let json = serde_json::to_string(&vector)?;
        let first = json.find("peak_deceleration").unwrap_or(usize::MAX);
        let last = json.find("corner_speed_reduction").unwrap_or(0);
        assert!(first < last);

        let back: DriverDnaVector = serde_json::from_str(&json)?;
        assert_eq!(back, vector);
        Ok(())
    }

    #[test]
    fn test_json_rejects_future_schema() -> TestResult {
        let vector = DriverDnaVector::new(sample_values())?;
        let json = serde_json::to_string(&vector)?.replace("\"schema_version\":1", "\"schema_version\":2");
        assert!(serde_json::from_str::<DriverDnaVector>(&json).is_err());
        Ok(())
    }

    #[test]
    fn test_zip_with_subtracts() -> TestResult {
        let a = DriverDnaVector::new(sample_values())?;
        let b = DriverDnaVector::zeros();
        let delta = b.zip_with(&a, |x, y| y - x)?;
        assert!((delta.get(FeatureId::GearChangeRate) - 13.5).abs() < 1e-12);
        Ok(())
    }
}
