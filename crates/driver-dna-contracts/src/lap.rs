//! Laps as delivered by the telemetry collaborator.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{Context, Season, Weather};
use crate::sample::TelemetrySample;

/// Identity and tags of a lap, shared by the raw lap and its canonical matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapMeta {
    /// Driver code (e.g. `VER`).
    pub driver_id: String,

    /// Circuit identifier (e.g. `monza`).
    pub track_id: String,

    /// Grouping context.
    pub context: Context,

    /// Lap number within the session.
    pub lap_number: u32,

    /// Lap time in seconds.
    pub lap_time_s: f64,

    /// False when the timing provider deleted or flagged the lap.
    #[serde(default = "default_valid")]
    pub is_valid: bool,

    /// Full circuit length; when absent the last sample distance is used.
    #[serde(default)]
    pub track_length_m: Option<f64>,
}

fn default_valid() -> bool {
    true
}

impl LapMeta {
    /// Session grouping used for personal-best lookups.
    pub fn session_key(&self) -> SessionKey {
        SessionKey {
            driver_id: self.driver_id.clone(),
            track_id: self.track_id.clone(),
            season: self.context.season,
            weather: self.context.weather,
        }
    }

    /// Short human-readable lap identifier, e.g. `VER#12@monza`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LapMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.driver_id, self.lap_number, self.track_id)
    }
}

/// One lap of telemetry. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Lap identity and tags.
    #[serde(flatten)]
    pub meta: LapMeta,

    /// Samples ordered by distance.
    pub samples: Vec<TelemetrySample>,
}

impl Lap {
    /// Create a valid lap.
    pub fn new(
        driver_id: impl Into<String>,
        track_id: impl Into<String>,
        context: Context,
        lap_number: u32,
        lap_time_s: f64,
        samples: Vec<TelemetrySample>,
    ) -> Self {
        Self {
            meta: LapMeta {
                driver_id: driver_id.into(),
                track_id: track_id.into(),
                context,
                lap_number,
                lap_time_s,
                is_valid: true,
                track_length_m: None,
            },
            samples,
        }
    }

    /// Set the validity flag.
    pub fn with_validity(mut self, is_valid: bool) -> Self {
        self.meta.is_valid = is_valid;
        self
    }

    /// Set the circuit length.
    pub fn with_track_length(mut self, length_m: f64) -> Self {
        self.meta.track_length_m = Some(length_m);
        self
    }

    /// Driver code.
    pub fn driver_id(&self) -> &str {
        &self.meta.driver_id
    }

    /// Grouping context.
    pub fn context(&self) -> Context {
        self.meta.context
    }

    /// Lap time in seconds.
    pub fn lap_time_s(&self) -> f64 {
        self.meta.lap_time_s
    }

    /// Validity flag.
    pub fn is_valid(&self) -> bool {
        self.meta.is_valid
    }

    /// Session grouping used for personal-best lookups.
    pub fn session_key(&self) -> SessionKey {
        self.meta.session_key()
    }

    /// Short human-readable lap identifier.
    pub fn id(&self) -> String {
        self.meta.id()
    }
}

/// (driver, track, season, weather): the scope of a personal best.
///
/// Wet and dry running at the same event are separate sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Driver code
    pub driver_id: String,
    /// Circuit identifier
    pub track_id: String,
    /// Season
    pub season: Season,
    /// Weather
    pub weather: Weather,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TrackType;

    fn ctx() -> Context {
        Context::new(TrackType::HighSpeed, Weather::Dry, Season(2023))
    }

    #[test]
    fn test_lap_id() {
        let lap = Lap::new("VER", "monza", ctx(), 12, 81.2, Vec::new());
        assert_eq!(lap.id(), "VER#12@monza");
    }

    #[test]
    fn test_session_key_separates_weather() {
        let dry = Lap::new("VER", "monza", ctx(), 1, 81.0, Vec::new());
        let mut wet_ctx = ctx();
        wet_ctx.weather = Weather::Wet;
        let wet = Lap::new("VER", "monza", wet_ctx, 2, 95.0, Vec::new());
        let dry_again = Lap::new("VER", "monza", ctx(), 3, 82.0, Vec::new());
        assert_ne!(dry.session_key(), wet.session_key());
        assert_eq!(dry.session_key(), dry_again.session_key());
        assert_eq!(wet.session_key().weather, Weather::Wet);
    }

    #[test]
    fn test_lap_deserializes_flat_tags() -> Result<(), serde_json::Error> {
        let json = r#"{
            "driver_id": "HAM",
            "track_id": "silverstone",
            "context": {"track_type": "high_speed", "weather": "wet", "season": 2022},
            "lap_number": 3,
            "lap_time_s": 99.5,
            "samples": [{"distance_m": 0.0, "speed_mps": 50.0}]
        }"#;
        let lap: Lap = serde_json::from_str(json)?;
        assert!(lap.is_valid());
        assert_eq!(lap.meta.track_length_m, None);
        assert_eq!(lap.samples.len(), 1);
        assert_eq!(lap.context().weather, Weather::Wet);
        Ok(())
    }
}
