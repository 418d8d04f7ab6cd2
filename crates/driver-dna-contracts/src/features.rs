//! The versioned feature schema.
//!
//! Feature order is part of the contract: position `i` of every style
//! vector means the same thing for every lap, driver and context. Bump
//! [`SCHEMA_VERSION`] whenever a feature is added, removed or reordered.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Version of the feature schema produced by this build.
pub const SCHEMA_VERSION: u16 = 1;

/// Number of features in the schema.
pub const FEATURE_COUNT: usize = 12;

/// Named driving-style features in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FeatureId {
    /// Peak longitudinal deceleration under braking (m/s²).
    PeakDeceleration = 0,
    /// Mean distance between brake onset and corner apex (m).
    BrakeOnsetDistance = 1,
    /// Variance of brake onset distance across corners (m²).
    BrakeOnsetVariance = 2,
    /// Mean brake pressure shortly after each brake application (0..1).
    BrakeIntensity = 3,
    /// Mean positive throttle rate after apexes (fraction per metre).
    ThrottleSmoothness = 4,
    /// Speed standard deviation in curvature-flagged zones (m/s).
    CornerSpeedConsistency = 5,
    /// Standard deviation of lateral position (m).
    RacingLineVariance = 6,
    /// Lap time relative to the personal best.
    LapPaceRatio = 7,
    /// Coefficient of variation of speed.
    SpeedVariability = 8,
    /// Gear changes per kilometre.
    GearChangeRate = 9,
    /// Mean corner entry speed over exit speed.
    EntryExitBias = 10,
    /// Mean apex speed over the faster of entry and exit.
    CornerSpeedReduction = 11,
}

/// How per-lap values of a feature combine into one context value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationRule {
    /// Per-feature median across laps.
    Median,
    /// Median of within-lap variances plus the between-lap variance of the
    /// per-lap means held in `mean_of`.
    PooledVariance {
        /// Feature holding the per-lap mean whose spread is pooled in
        mean_of: FeatureId,
    },
}

impl FeatureId {
    /// Every feature in schema order.
    pub const ALL: [FeatureId; FEATURE_COUNT] = [
        FeatureId::PeakDeceleration,
        FeatureId::BrakeOnsetDistance,
        FeatureId::BrakeOnsetVariance,
        FeatureId::BrakeIntensity,
        FeatureId::ThrottleSmoothness,
        FeatureId::CornerSpeedConsistency,
        FeatureId::RacingLineVariance,
        FeatureId::LapPaceRatio,
        FeatureId::SpeedVariability,
        FeatureId::GearChangeRate,
        FeatureId::EntryExitBias,
        FeatureId::CornerSpeedReduction,
    ];

    /// Position in every style vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name used in tables and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            FeatureId::PeakDeceleration => "peak_deceleration",
            FeatureId::BrakeOnsetDistance => "brake_onset_distance",
            FeatureId::BrakeOnsetVariance => "brake_onset_variance",
            FeatureId::BrakeIntensity => "brake_intensity",
            FeatureId::ThrottleSmoothness => "throttle_smoothness",
            FeatureId::CornerSpeedConsistency => "corner_speed_consistency",
            FeatureId::RacingLineVariance => "racing_line_variance",
            FeatureId::LapPaceRatio => "lap_pace_ratio",
            FeatureId::SpeedVariability => "speed_variability",
            FeatureId::GearChangeRate => "gear_change_rate",
            FeatureId::EntryExitBias => "entry_exit_bias",
            FeatureId::CornerSpeedReduction => "corner_speed_reduction",
        }
    }

    /// Look a feature up by its schema name.
    pub fn from_name(name: &str) -> Option<FeatureId> {
        FeatureId::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Look a feature up by position.
    pub fn from_index(index: usize) -> Option<FeatureId> {
        FeatureId::ALL.get(index).copied()
    }

    /// Unit of the raw feature value.
    pub const fn unit(self) -> &'static str {
        match self {
            FeatureId::PeakDeceleration => "m/s²",
            FeatureId::BrakeOnsetDistance | FeatureId::RacingLineVariance => "m",
            FeatureId::BrakeOnsetVariance => "m²",
            FeatureId::ThrottleSmoothness => "1/m",
            FeatureId::CornerSpeedConsistency => "m/s",
            FeatureId::GearChangeRate => "1/km",
            FeatureId::BrakeIntensity
            | FeatureId::LapPaceRatio
            | FeatureId::SpeedVariability
            | FeatureId::EntryExitBias
            | FeatureId::CornerSpeedReduction => "ratio",
        }
    }

    /// Trait phrases for a value well above and well below the population mean.
    pub const fn trait_phrases(self) -> (&'static str, &'static str) {
        match self {
            FeatureId::PeakDeceleration => ("Aggressive Braking", "Gentle Braking"),
            FeatureId::BrakeOnsetDistance => ("Early Braking", "Late Braking"),
            FeatureId::BrakeOnsetVariance => ("Variable Brake Points", "Consistent Brake Points"),
            FeatureId::BrakeIntensity => ("Hard Initial Brake", "Progressive Brake"),
            FeatureId::ThrottleSmoothness => ("Aggressive Throttle", "Smooth Throttle"),
            FeatureId::CornerSpeedConsistency => {
                ("Variable Mid-Corner Speed", "Consistent Mid-Corner Speed")
            }
            FeatureId::RacingLineVariance => ("Wide Line Usage", "Tight Line"),
            FeatureId::LapPaceRatio => ("Off Personal Pace", "On Personal Pace"),
            FeatureId::SpeedVariability => ("Stop-Go", "Flowing"),
            FeatureId::GearChangeRate => ("Busy Shifting", "Economical Shifting"),
            FeatureId::EntryExitBias => ("Entry-Focused", "Exit-Focused"),
            FeatureId::CornerSpeedReduction => ("High Minimum Speed", "V-Shaped Cornering"),
        }
    }

    /// How this feature is combined across laps.
    pub const fn aggregation(self) -> AggregationRule {
        match self {
            FeatureId::BrakeOnsetVariance => AggregationRule::PooledVariance {
                mean_of: FeatureId::BrakeOnsetDistance,
            },
            _ => AggregationRule::Median,
        }
    }

    /// Comma separated list of every feature name, for error messages.
    pub fn names() -> String {
        FeatureId::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
