//! Contextual grouping keys.
//!
//! A [`Context`] is the (track type, weather, season) triple that style
//! vectors are grouped by and compared across.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Broad circuit character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    /// Long straights, fast sweepers (Monza, Spa)
    HighSpeed,
    /// Tight sequences, low average speed (Hungaroring, Monaco-style permanent tracks)
    Technical,
    /// Temporary street circuits with walls close to the line
    Street,
    /// Everything in between
    Balanced,
}

impl TrackType {
    /// All track types in canonical order.
    pub const ALL: [TrackType; 4] = [
        TrackType::HighSpeed,
        TrackType::Technical,
        TrackType::Street,
        TrackType::Balanced,
    ];

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            TrackType::HighSpeed => "high_speed",
            TrackType::Technical => "technical",
            TrackType::Street => "street",
            TrackType::Balanced => "balanced",
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown track type '{s}'"))
    }
}

/// Session weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// Dry track
    Dry,
    /// Wet track, rain tyres
    Wet,
    /// Drying or changing conditions
    Mixed,
}

impl Weather {
    /// All weather kinds in canonical order.
    pub const ALL: [Weather; 3] = [Weather::Dry, Weather::Wet, Weather::Mixed];

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Weather::Dry => "dry",
            Weather::Wet => "wet",
            Weather::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weather::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown weather '{s}'"))
    }
}

/// Championship season (calendar year).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Season(pub u16);

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grouping key for style comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Context {
    /// Circuit character
    pub track_type: TrackType,
    /// Session weather
    pub weather: Weather,
    /// Season
    pub season: Season,
}

impl Context {
    /// Create a new context.
    pub const fn new(track_type: TrackType, weather: Weather, season: Season) -> Self {
        Self {
            track_type,
            weather,
            season,
        }
    }

    /// Return the dimensions along which two contexts differ.
    pub fn differing_dimensions(&self, other: &Context) -> Vec<ContextDimension> {
        ContextDimension::ALL
            .into_iter()
            .filter(|dim| !dim.agrees(self, other))
            .collect()
    }

    /// True when `self` and `other` differ in `dimension` and nowhere else.
    pub fn differs_only_in(&self, other: &Context, dimension: ContextDimension) -> bool {
        self.differing_dimensions(other) == [dimension]
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.track_type, self.weather, self.season)
    }
}

impl FromStr for Context {
    type Err = String;

    /// Parse the `track_type/weather/season` display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let (Some(track), Some(weather), Some(season), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected 'track_type/weather/season', got '{s}'"));
        };
        let season = season
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid season '{season}': {e}"))?;
        Ok(Context::new(
            track.trim().parse()?,
            weather.trim().parse()?,
            Season(season),
        ))
    }
}

/// One axis of a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextDimension {
    /// Circuit character
    TrackType,
    /// Session weather
    Weather,
    /// Season
    Season,
}

impl ContextDimension {
    /// All dimensions in canonical order.
    pub const ALL: [ContextDimension; 3] = [
        ContextDimension::TrackType,
        ContextDimension::Weather,
        ContextDimension::Season,
    ];

    /// True when both contexts share the value of this dimension.
    pub fn agrees(self, a: &Context, b: &Context) -> bool {
        match self {
            ContextDimension::TrackType => a.track_type == b.track_type,
            ContextDimension::Weather => a.weather == b.weather,
            ContextDimension::Season => a.season == b.season,
        }
    }

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ContextDimension::TrackType => "track_type",
            ContextDimension::Weather => "weather",
            ContextDimension::Season => "season",
        }
    }
}

impl fmt::Display for ContextDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_display_roundtrip() -> TestResult {
        let ctx = Context::new(TrackType::Street, Weather::Wet, Season(2023));
        assert_eq!(ctx.to_string(), "street/wet/2023");
        let parsed: Context = "street/wet/2023".parse()?;
        assert_eq!(parsed, ctx);
        Ok(())
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("street/wet".parse::<Context>().is_err());
        assert!("street/wet/2023/extra".parse::<Context>().is_err());
        assert!("street/snow/2023".parse::<Context>().is_err());
        assert!("street/wet/twenty".parse::<Context>().is_err());
    }

    #[test]
    fn test_differs_only_in() {
        let dry = Context::new(TrackType::HighSpeed, Weather::Dry, Season(2022));
        let wet = Context::new(TrackType::HighSpeed, Weather::Wet, Season(2022));
        let wet_next = Context::new(TrackType::HighSpeed, Weather::Wet, Season(2023));

        assert!(dry.differs_only_in(&wet, ContextDimension::Weather));
        assert!(!dry.differs_only_in(&wet, ContextDimension::Season));
        assert!(!dry.differs_only_in(&wet_next, ContextDimension::Weather));
        assert!(!dry.differs_only_in(&dry, ContextDimension::Weather));
    }

    #[test]
    fn test_ordering_is_total() {
        let mut contexts = vec![
            Context::new(TrackType::Street, Weather::Dry, Season(2023)),
            Context::new(TrackType::HighSpeed, Weather::Wet, Season(2022)),
            Context::new(TrackType::HighSpeed, Weather::Dry, Season(2022)),
        ];
        contexts.sort();
        assert_eq!(contexts.first().map(|c| c.weather), Some(Weather::Dry));
        assert_eq!(contexts.last().map(|c| c.track_type), Some(TrackType::Street));
    }
}
