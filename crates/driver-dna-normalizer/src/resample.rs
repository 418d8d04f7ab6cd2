//! Validated raw columns and distance-grid resampling.

use driver_dna_contracts::{Channel, Lap};
use driver_dna_errors::DataQualityError;

/// Raw lap telemetry split into one column per channel.
///
/// Construction validates presence, finiteness and distance ordering, so
/// every column has the same length and distance strictly increases.
#[derive(Debug, Clone)]
pub(crate) struct RawColumns {
    pub distance: Vec<f64>,
    pub speed: Vec<f64>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    pub gear: Vec<i8>,
    pub steering: Vec<f64>,
    pub lateral: Vec<f64>,
}

impl RawColumns {
    pub(crate) fn from_lap(lap: &Lap, lap_id: &str) -> Result<Self, DataQualityError> {
        let n = lap.samples.len();
        let mut columns = RawColumns {
            distance: Vec::with_capacity(n),
            speed: Vec::with_capacity(n),
            throttle: Vec::with_capacity(n),
            brake: Vec::with_capacity(n),
            gear: Vec::with_capacity(n),
            steering: Vec::with_capacity(n),
            lateral: Vec::with_capacity(n),
        };

        for (index, sample) in lap.samples.iter().enumerate() {
            if !sample.distance_m.is_finite() {
                return Err(DataQualityError::NonFiniteValue {
                    lap: lap_id.to_string(),
                    channel: "distance_m",
                    index,
                });
            }
            for channel in Channel::ALL {
                match sample.channel(channel) {
                    None => {
                        return Err(DataQualityError::MissingChannel {
                            lap: lap_id.to_string(),
                            channel: channel.name(),
                            index,
                        });
                    }
                    Some(value) if !value.is_finite() => {
                        return Err(DataQualityError::NonFiniteValue {
                            lap: lap_id.to_string(),
                            channel: channel.name(),
                            index,
                        });
                    }
                    Some(_) => {}
                }
            }

            columns.distance.push(sample.distance_m);
            columns.speed.push(sample.speed_mps.unwrap_or_default());
            columns.throttle.push(sample.throttle.unwrap_or_default());
            columns.brake.push(sample.brake.unwrap_or_default());
            columns.gear.push(sample.gear.unwrap_or_default());
            columns.steering.push(sample.steering_angle.unwrap_or_default());
            columns.lateral.push(sample.lateral_position.unwrap_or_default());
        }

        for (offset, pair) in columns.distance.windows(2).enumerate() {
            if let [previous, current] = *pair
                && current <= previous
            {
                return Err(DataQualityError::NonMonotonicDistance {
                    lap: lap_id.to_string(),
                    index: offset + 1,
                    previous,
                    current,
                });
            }
        }

        Ok(columns)
    }

    /// Find the widest gap between consecutive samples: `(from_m, gap_m)`.
    pub(crate) fn widest_gap(&self) -> Option<(f64, f64)> {
        self.distance
            .windows(2)
            .filter_map(|pair| match *pair {
                [a, b] => Some((a, b - a)),
                _ => None,
            })
            .max_by(|x, y| x.1.total_cmp(&y.1))
    }

    pub(crate) fn last_distance(&self) -> Option<f64> {
        self.distance.last().copied()
    }
}

/// Where a grid position falls relative to the raw samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Position {
    /// Before the first sample.
    Before,
    /// After the last sample.
    After,
    /// Between samples `lo` and `lo + 1`, at fraction `t` from `lo`.
    Between { lo: usize, t: f64 },
}

/// Locate `x` in a strictly increasing distance column.
pub(crate) fn locate(distance: &[f64], x: f64) -> Position {
    let above = distance.partition_point(|d| *d <= x);
    if above == 0 {
        return Position::Before;
    }
    let lo = above - 1;
    match (distance.get(lo), distance.get(above)) {
        (Some(x0), Some(x1)) => Position::Between {
            lo,
            t: (x - x0) / (x1 - x0),
        },
        // x at or beyond the last sample
        _ if lo + 1 == distance.len() && distance.last().is_some_and(|last| x <= *last) => {
            Position::Between { lo, t: 0.0 }
        }
        _ => Position::After,
    }
}

/// Linear interpolation of `values` at `position`, holding edge values.
pub(crate) fn interpolate(values: &[f64], position: Position) -> f64 {
    match position {
        Position::Before => values.first().copied().unwrap_or_default(),
        Position::After => values.last().copied().unwrap_or_default(),
        Position::Between { lo, t } => match (values.get(lo), values.get(lo + 1)) {
            (Some(a), Some(b)) => a + (b - a) * t,
            (Some(a), None) => *a,
            _ => values.last().copied().unwrap_or_default(),
        },
    }
}

/// Previous-sample hold of `values` at `position`.
pub(crate) fn hold<T: Copy + Default>(values: &[T], position: Position) -> T {
    match position {
        Position::Before => values.first().copied().unwrap_or_default(),
        Position::After => values.last().copied().unwrap_or_default(),
        Position::Between { lo, .. } => values.get(lo).copied().unwrap_or_default(),
    }
}
