//! Raw telemetry samples.

use serde::{Deserialize, Serialize};

/// One telemetry reading along a lap.
///
/// Every channel except distance is optional so that gaps in the
/// collaborator's data can be detected instead of silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TelemetrySample {
    /// Distance from the start line in metres.
    pub distance_m: f64,

    /// Vehicle speed in metres per second.
    pub speed_mps: Option<f64>,

    /// Throttle pedal position (0.0 to 1.0).
    pub throttle: Option<f64>,

    /// Brake pedal position (0.0 to 1.0).
    pub brake: Option<f64>,

    /// Current gear (-1 = reverse, 0 = neutral, 1+ = forward gears).
    pub gear: Option<i8>,

    /// Steering angle in radians, positive to the left.
    pub steering_angle: Option<f64>,

    /// Lateral offset from the track centreline in metres.
    pub lateral_position: Option<f64>,
}

impl TelemetrySample {
    /// Create a sample at the given distance with no channels set.
    pub fn at(distance_m: f64) -> Self {
        Self {
            distance_m,
            ..Self::default()
        }
    }

    /// Create a sample with every channel present.
    pub fn full(
        distance_m: f64,
        speed_mps: f64,
        throttle: f64,
        brake: f64,
        gear: i8,
        steering_angle: f64,
        lateral_position: f64,
    ) -> Self {
        Self {
            distance_m,
            speed_mps: Some(speed_mps),
            throttle: Some(throttle),
            brake: Some(brake),
            gear: Some(gear),
            steering_angle: Some(steering_angle),
            lateral_position: Some(lateral_position),
        }
    }

    /// Set speed.
    pub fn with_speed_mps(mut self, value: f64) -> Self {
        self.speed_mps = Some(value);
        self
    }

    /// Set throttle, clamped to [0, 1].
    pub fn with_throttle(mut self, value: f64) -> Self {
        self.throttle = Some(value.clamp(0.0, 1.0));
        self
    }

    /// Set brake, clamped to [0, 1].
    pub fn with_brake(mut self, value: f64) -> Self {
        self.brake = Some(value.clamp(0.0, 1.0));
        self
    }

    /// Set gear.
    pub fn with_gear(mut self, value: i8) -> Self {
        self.gear = Some(value);
        self
    }

    /// Set steering angle.
    pub fn with_steering_angle(mut self, value: f64) -> Self {
        self.steering_angle = Some(value);
        self
    }

    /// Set lateral position.
    pub fn with_lateral_position(mut self, value: f64) -> Self {
        self.lateral_position = Some(value);
        self
    }

    /// Read a channel as `f64`.
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Speed => self.speed_mps,
            Channel::Throttle => self.throttle,
            Channel::Brake => self.brake,
            Channel::Gear => self.gear.map(f64::from),
            Channel::Steering => self.steering_angle,
            Channel::Lateral => self.lateral_position,
        }
    }
}

/// Telemetry channels required by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Vehicle speed
    Speed,
    /// Throttle pedal
    Throttle,
    /// Brake pedal
    Brake,
    /// Selected gear
    Gear,
    /// Steering angle
    Steering,
    /// Lateral position
    Lateral,
}

impl Channel {
    /// All required channels in canonical order.
    pub const ALL: [Channel; 6] = [
        Channel::Speed,
        Channel::Throttle,
        Channel::Brake,
        Channel::Gear,
        Channel::Steering,
        Channel::Lateral,
    ];

    /// Field name as it appears on [`TelemetrySample`].
    pub const fn name(self) -> &'static str {
        match self {
            Channel::Speed => "speed_mps",
            Channel::Throttle => "throttle",
            Channel::Brake => "brake",
            Channel::Gear => "gear",
            Channel::Steering => "steering_angle",
            Channel::Lateral => "lateral_position",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps_pedals() {
        let sample = TelemetrySample::at(10.0).with_throttle(1.4).with_brake(-0.2);
        assert_eq!(sample.throttle, Some(1.0));
        assert_eq!(sample.brake, Some(0.0));
    }

    #[test]
    fn test_channel_lookup() {
        let sample = TelemetrySample::full(5.0, 60.0, 1.0, 0.0, 7, 0.01, -1.5);
        assert_eq!(sample.channel(Channel::Gear), Some(7.0));
        assert_eq!(sample.channel(Channel::Lateral), Some(-1.5));
        assert_eq!(TelemetrySample::at(1.0).channel(Channel::Speed), None);
    }

    #[test]
    fn test_channel_names_unique() {
        let names: std::collections::HashSet<_> = Channel::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Channel::ALL.len());
    }
}
