//! The canonical, distance-indexed lap representation.

use serde::{Deserialize, Serialize};

use crate::lap::LapMeta;

/// A lap resampled onto a fixed number of equal-width distance bins.
///
/// Struct of arrays: every channel vector has exactly [`bin_count`]
/// entries, and entry `i` of each channel describes the bin centred at
/// `distance_m[i]`.
///
/// [`bin_count`]: CanonicalLapMatrix::bin_count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalLapMatrix {
    /// Identity and tags of the source lap.
    pub meta: LapMeta,
    /// Length of the distance grid in metres.
    pub lap_length_m: f64,
    /// Width of one bin in metres.
    pub bin_width_m: f64,
    /// Bin centre distances.
    pub distance_m: Vec<f64>,
    /// Speed in m/s.
    pub speed_mps: Vec<f64>,
    /// Throttle fraction.
    pub throttle: Vec<f64>,
    /// Brake fraction.
    pub brake: Vec<f64>,
    /// Gear, held from the previous raw sample.
    pub gear: Vec<i8>,
    /// Steering angle in radians.
    pub steering_angle: Vec<f64>,
    /// Lateral offset in metres.
    pub lateral_position: Vec<f64>,
}

impl CanonicalLapMatrix {
    /// Number of distance bins.
    pub fn bin_count(&self) -> usize {
        self.distance_m.len()
    }

    /// True when every channel has the same length as the distance grid.
    pub fn is_consistent(&self) -> bool {
        let n = self.bin_count();
        [
            self.speed_mps.len(),
            self.throttle.len(),
            self.brake.len(),
            self.gear.len(),
            self.steering_angle.len(),
            self.lateral_position.len(),
        ]
        .iter()
        .all(|len| *len == n)
    }

    /// Speed at bin `i`, if it exists.
    pub fn speed_at(&self, i: usize) -> Option<f64> {
        self.speed_mps.get(i).copied()
    }
}
