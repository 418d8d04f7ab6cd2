//! Synthetic lap fixtures.
//!
//! [`LapBuilder`] produces laps whose samples sit exactly on the canonical
//! bin centres used by [`fixture_config`], so normalization is lossless and
//! features can be predicted by hand. Each corner is a V-shaped speed
//! trace: linear deceleration from top speed starting at the brake onset,
//! a single apex bin, then a linear exit back to top speed.

use std::path::Path;

use anyhow::Context as _;
use driver_dna_config::PipelineConfig;
use driver_dna_contracts::{Context, Lap, Season, TelemetrySample, TrackType, Weather};

/// Default lap length in metres.
pub const LAP_LENGTH_M: f64 = 3000.0;

/// Default apex positions; chosen on 1 m bin centres.
pub const DEFAULT_APEXES_M: [f64; 3] = [600.5, 1400.5, 2200.5];

/// Brake pressure applied in every braking zone.
pub const BRAKE_PRESSURE: f64 = 0.8;

/// One corner of a synthetic lap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSpec {
    /// Apex position in metres.
    pub apex_m: f64,
    /// Distance from brake onset to apex in metres.
    pub brake_onset_m: f64,
    /// Speed at the apex.
    pub apex_speed_mps: f64,
    /// Distance from the apex back to top speed.
    pub exit_length_m: f64,
}

impl CornerSpec {
    /// Corner at `apex_m` with the default shape.
    pub fn at(apex_m: f64) -> Self {
        Self {
            apex_m,
            brake_onset_m: 120.0,
            apex_speed_mps: 30.0,
            exit_length_m: 200.0,
        }
    }
}

/// Builder for synthetic laps.
#[derive(Debug, Clone)]
pub struct LapBuilder {
    driver: String,
    track: String,
    context: Context,
    lap_number: u32,
    lap_time_s: f64,
    valid: bool,
    length_m: f64,
    spacing_m: f64,
    top_speed_mps: f64,
    line_amplitude_m: f64,
    corners: Vec<CornerSpec>,
}

impl LapBuilder {
    /// Three-corner lap for `driver` in `context`.
    pub fn new(driver: &str, context: Context) -> Self {
        Self {
            driver: driver.to_string(),
            track: "synthetic".to_string(),
            context,
            lap_number: 1,
            lap_time_s: 90.0,
            valid: true,
            length_m: LAP_LENGTH_M,
            spacing_m: 1.0,
            top_speed_mps: 80.0,
            line_amplitude_m: 1.5,
            corners: DEFAULT_APEXES_M.iter().map(|a| CornerSpec::at(*a)).collect(),
        }
    }

    /// Set the circuit id.
    pub fn track(mut self, track: &str) -> Self {
        self.track = track.to_string();
        self
    }

    /// Set the lap number.
    pub fn lap_number(mut self, lap_number: u32) -> Self {
        self.lap_number = lap_number;
        self
    }

    /// Set the lap time.
    pub fn lap_time(mut self, lap_time_s: f64) -> Self {
        self.lap_time_s = lap_time_s;
        self
    }

    /// Flag the lap invalid.
    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Set the sample spacing. Keep `LAP_LENGTH_M / spacing` equal to the
    /// configured bin count for lossless normalization.
    pub fn spacing(mut self, spacing_m: f64) -> Self {
        self.spacing_m = spacing_m;
        self
    }

    /// Set the amplitude of the lateral weave.
    pub fn line_amplitude(mut self, amplitude_m: f64) -> Self {
        self.line_amplitude_m = amplitude_m;
        self
    }

    /// Set the brake onset distance of every corner.
    pub fn brake_onset(mut self, brake_onset_m: f64) -> Self {
        for corner in &mut self.corners {
            corner.brake_onset_m = brake_onset_m;
        }
        self
    }

    /// Set per-corner brake onset distances; extra values are ignored.
    pub fn brake_onsets(mut self, onsets_m: &[f64]) -> Self {
        for (corner, onset) in self.corners.iter_mut().zip(onsets_m) {
            corner.brake_onset_m = *onset;
        }
        self
    }

    /// Set the apex speed of every corner.
    pub fn apex_speed(mut self, apex_speed_mps: f64) -> Self {
        for corner in &mut self.corners {
            corner.apex_speed_mps = apex_speed_mps;
        }
        self
    }

    /// Replace the corners.
    pub fn corners(mut self, corners: Vec<CornerSpec>) -> Self {
        self.corners = corners;
        self
    }

    /// Remove every corner (constant-speed lap).
    pub fn straight(self) -> Self {
        self.corners(Vec::new())
    }

    /// Build the lap.
    pub fn build(&self) -> Lap {
        let count = (self.length_m / self.spacing_m).round() as usize;
        let samples = (0..count)
            .map(|i| self.sample_at(self.spacing_m * (i as f64 + 0.5)))
            .collect();
        Lap::new(
            self.driver.clone(),
            self.track.clone(),
            self.context,
            self.lap_number,
            self.lap_time_s,
            samples,
        )
        .with_track_length(self.length_m)
        .with_validity(self.valid)
    }

    fn sample_at(&self, d: f64) -> TelemetrySample {
        let mut speed = self.top_speed_mps;
        let mut throttle = 1.0;
        let mut brake = 0.0;
        let mut steering = 0.0;

        for corner in &self.corners {
            let onset = corner.apex_m - corner.brake_onset_m;
            let exit = corner.apex_m + corner.exit_length_m;
            if d >= onset && d < corner.apex_m {
                let t = (d - onset) / corner.brake_onset_m;
                speed = self.top_speed_mps + (corner.apex_speed_mps - self.top_speed_mps) * t;
                throttle = 0.0;
                brake = BRAKE_PRESSURE;
            } else if d >= corner.apex_m && d < exit {
                let t = (d - corner.apex_m) / corner.exit_length_m;
                speed = corner.apex_speed_mps + (self.top_speed_mps - corner.apex_speed_mps) * t;
                throttle = t;
            }
            if (d - corner.apex_m).abs() <= 50.0 {
                steering = 0.2;
            }
        }

        let gear = (1.0 + speed / 12.0).floor().clamp(1.0, 8.0) as i8;
        let lateral = self.line_amplitude_m * (d / 200.0).sin();
        TelemetrySample::full(d, speed, throttle, brake, gear, steering, lateral)
    }
}

/// Dry 2023 high-speed context.
pub fn dry_context() -> Context {
    Context::new(TrackType::HighSpeed, Weather::Dry, Season(2023))
}

/// Wet 2023 high-speed context.
pub fn wet_context() -> Context {
    Context::new(TrackType::HighSpeed, Weather::Wet, Season(2023))
}

/// Configuration matching [`LapBuilder`] defaults: one bin per metre and a
/// corner window long enough to see every braking zone.
pub fn fixture_config() -> PipelineConfig {
    let mut config = PipelineConfig::default().with_seed(7);
    config.normalizer.bin_count = LAP_LENGTH_M as usize;
    config.extractor.corner_window_bins = 200;
    config.extractor.throttle_window_bins = 40;
    config.cluster.k_min = 2;
    config.cluster.k_max = 2;
    config
}

/// Laps for one driver with the given per-lap brake onset distances.
pub fn laps_with_onsets(driver: &str, context: Context, onsets_m: &[f64]) -> Vec<Lap> {
    onsets_m
        .iter()
        .zip(1u32..)
        .map(|(onset, lap_number)| {
            LapBuilder::new(driver, context)
                .lap_number(lap_number)
                .brake_onset(*onset)
                .build()
        })
        .collect()
}

/// Write laps to a JSON file.
pub fn write_laps_json(path: &Path, laps: &[Lap]) -> anyhow::Result<()> {
    let json = serde_json::to_string(laps).context("serialize laps")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Read laps from a JSON file.
pub fn read_laps_json(path: &Path) -> anyhow::Result<Vec<Lap>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse laps from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_sit_on_bin_centres() {
        let lap = LapBuilder::new("AAA", dry_context()).build();
        assert_eq!(lap.samples.len(), 3000);
        let first = lap.samples.first().map(|s| s.distance_m);
        assert_eq!(first, Some(0.5));
        assert_eq!(lap.meta.track_length_m, Some(LAP_LENGTH_M));
    }

    #[test]
    fn test_brake_starts_at_onset() {
        let lap = LapBuilder::new("AAA", dry_context()).brake_onset(100.0).build();
        let first_braking = lap
            .samples
            .iter()
            .find(|s| s.brake.is_some_and(|b| b > 0.0))
            .map(|s| s.distance_m);
        assert_eq!(first_braking, Some(500.5));
    }

    #[test]
    fn test_apex_is_slowest_sample() {
        let lap = LapBuilder::new("AAA", dry_context()).build();
        let slowest = lap
            .samples
            .iter()
            .min_by(|a, b| {
                let speed = |s: &TelemetrySample| s.speed_mps.unwrap_or(f64::INFINITY);
                speed(a).total_cmp(&speed(b))
            })
            .map(|s| s.distance_m);
        assert_eq!(slowest, Some(600.5));
    }
}
