//! Lap-time outlier rejection.
//!
//! Runs before extraction: a lap that is flagged invalid, or that is slower
//! than the session personal best by more than the configured fraction, is
//! excluded and recorded together with the reason.

use std::collections::BTreeMap;
use std::fmt;

use driver_dna_config::{OutlierConfig, PipelineConfig};
use driver_dna_contracts::{Context, Lap, SessionKey};
use driver_dna_errors::DataQualityError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a lap did not contribute to its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Flagged invalid by timing, or the lap time is unusable
    Invalid,
    /// Slower than the personal best by more than the allowed fraction
    TooSlow {
        /// Lap time over personal best
        ratio: f64,
        /// Largest accepted ratio
        limit: f64,
    },
    /// Normalization or extraction failed
    DataQuality {
        /// Machine-readable reason code
        code: String,
        /// Human-readable message
        message: String,
    },
}

impl From<&DataQualityError> for ExclusionReason {
    fn from(err: &DataQualityError) -> Self {
        ExclusionReason::DataQuality {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Invalid => f.write_str("invalid lap"),
            ExclusionReason::TooSlow { ratio, limit } => {
                write!(f, "too slow ({:.1}% of personal best, limit {:.1}%)", ratio * 100.0, limit * 100.0)
            }
            ExclusionReason::DataQuality { message, .. } => f.write_str(message),
        }
    }
}

/// A lap left out of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapExclusion {
    /// Lap identifier, e.g. `VER#12@monza`
    pub lap: String,
    /// Driver code
    pub driver_id: String,
    /// Grouping context
    pub context: Context,
    /// Why it was left out
    pub reason: ExclusionReason,
}

impl LapExclusion {
    /// Record an exclusion for `lap`.
    pub fn new(lap: &Lap, reason: ExclusionReason) -> Self {
        Self {
            lap: lap.id(),
            driver_id: lap.driver_id().to_string(),
            context: lap.context(),
            reason,
        }
    }
}

/// A lap that passed the filter.
#[derive(Debug, Clone, Copy)]
pub struct KeptLap<'a> {
    /// The lap
    pub lap: &'a Lap,
    /// Fastest valid lap time of the same session
    pub personal_best_s: Option<f64>,
}

/// Result of [`OutlierFilter::partition`].
#[derive(Debug, Clone, Default)]
pub struct OutlierPartition<'a> {
    /// Laps that continue to extraction
    pub kept: Vec<KeptLap<'a>>,
    /// Laps left out, with reasons
    pub excluded: Vec<LapExclusion>,
}

/// Splits laps into kept and excluded before extraction.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    max_slower_fraction: f64,
}

impl OutlierFilter {
    /// Create a filter.
    pub fn new(config: &OutlierConfig) -> Self {
        Self {
            max_slower_fraction: config.max_slower_fraction,
        }
    }

    /// Create a filter from the pipeline configuration.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self::new(&config.outliers)
    }

    /// Fastest valid lap time per (driver, track, season, weather).
    pub fn personal_bests(laps: &[Lap]) -> BTreeMap<SessionKey, f64> {
        let mut bests: BTreeMap<SessionKey, f64> = BTreeMap::new();
        for lap in laps.iter().filter(|lap| has_usable_time(lap)) {
            bests
                .entry(lap.session_key())
                .and_modify(|best| *best = best.min(lap.lap_time_s()))
                .or_insert(lap.lap_time_s());
        }
        bests
    }

    /// Partition laps into kept and excluded, preserving input order.
    pub fn partition<'a>(&self, laps: &'a [Lap]) -> OutlierPartition<'a> {
        let bests = Self::personal_bests(laps);
        let limit = 1.0 + self.max_slower_fraction;
        let mut partition = OutlierPartition::default();

        for lap in laps {
            let best = bests.get(&lap.session_key()).copied();
            let reason = match best {
                _ if !has_usable_time(lap) => Some(ExclusionReason::Invalid),
                Some(best) if lap.lap_time_s() > best * limit => Some(ExclusionReason::TooSlow {
                    ratio: lap.lap_time_s() / best,
                    limit,
                }),
                _ => None,
            };

            match reason {
                Some(reason) => {
                    debug!(lap = %lap.id(), %reason, "Excluding lap");
                    partition.excluded.push(LapExclusion::new(lap, reason));
                }
                None => partition.kept.push(KeptLap {
                    lap,
                    personal_best_s: best,
                }),
            }
        }
        partition
    }
}

fn has_usable_time(lap: &Lap) -> bool {
    lap.is_valid() && lap.lap_time_s().is_finite() && lap.lap_time_s() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_dna_contracts::{Season, TrackType, Weather};

    fn lap(driver: &str, track: &str, number: u32, time: f64) -> Lap {
        let ctx = Context::new(TrackType::Street, Weather::Dry, Season(2023));
        Lap::new(driver, track, ctx, number, time, Vec::new())
    }

    fn wet_lap(driver: &str, track: &str, number: u32, time: f64) -> Lap {
        let ctx = Context::new(TrackType::Street, Weather::Wet, Season(2023));
        Lap::new(driver, track, ctx, number, time, Vec::new())
    }

    #[test]
    fn test_107_percent_rule() {
        let laps = vec![
            lap("VER", "monaco", 1, 72.0),
            lap("VER", "monaco", 2, 77.0),
            lap("VER", "monaco", 3, 77.1),
        ];
        let filter = OutlierFilter::new(&OutlierConfig::default());
        let partition = filter.partition(&laps);
        assert_eq!(partition.kept.len(), 2);
        assert_eq!(partition.excluded.len(), 1);
        assert!(matches!(
            partition.excluded.first().map(|e| &e.reason),
            Some(ExclusionReason::TooSlow { .. })
        ));
    }

    #[test]
    fn test_invalid_lap_does_not_set_personal_best() {
        let laps = vec![
            lap("VER", "monaco", 1, 60.0).with_validity(false),
            lap("VER", "monaco", 2, 72.0),
        ];
        let filter = OutlierFilter::new(&OutlierConfig::default());
        let partition = filter.partition(&laps);
        assert_eq!(partition.kept.len(), 1);
        assert_eq!(
            partition.excluded.first().map(|e| e.reason.clone()),
            Some(ExclusionReason::Invalid)
        );
        let best = partition.kept.first().and_then(|k| k.personal_best_s);
        assert!(best.is_some_and(|b| (b - 72.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_personal_best_is_per_session() {
        let laps = vec![
            lap("VER", "monaco", 1, 72.0),
            lap("VER", "baku", 1, 103.0),
            lap("HAM", "monaco", 1, 73.0),
        ];
        let bests = OutlierFilter::personal_bests(&laps);
        assert_eq!(bests.len(), 3);
        let filter = OutlierFilter::new(&OutlierConfig::default());
        assert!(filter.partition(&laps).excluded.is_empty());
    }

    #[test]
    fn test_wet_laps_use_wet_personal_best() {
        let laps = vec![
            lap("VER", "monaco", 1, 72.0),
            wet_lap("VER", "monaco", 2, 81.0),
            wet_lap("VER", "monaco", 3, 84.0),
            wet_lap("VER", "monaco", 4, 90.0),
        ];
        let filter = OutlierFilter::new(&OutlierConfig::default());
        let partition = filter.partition(&laps);

        assert_eq!(partition.kept.len(), 3);
        let excluded: Vec<&str> = partition.excluded.iter().map(|e| e.lap.as_str()).collect();
        assert_eq!(excluded, vec!["VER#4@monaco"]);
        let wet_best = partition
            .kept
            .iter()
            .filter(|k| k.lap.context().weather == Weather::Wet)
            .filter_map(|k| k.personal_best_s)
            .collect::<Vec<_>>();
        assert_eq!(wet_best.len(), 2);
        assert!(wet_best.iter().all(|b| (b - 81.0).abs() < f64::EPSILON));
    }
}
