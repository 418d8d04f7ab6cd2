//! Corner and braking-zone detection on the canonical grid.

use driver_dna_config::ExtractorConfig;

/// A significant corner found in the speed trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    /// Bin of minimum speed.
    pub apex: usize,
    /// First bin of the approach.
    pub entry: usize,
    /// Last bin of the exit.
    pub exit: usize,
    /// Speed at the apex.
    pub apex_speed: f64,
    /// Speed at `entry`.
    pub entry_speed: f64,
    /// Speed at `exit`.
    pub exit_speed: f64,
}

impl Corner {
    /// Entry speed over exit speed.
    pub fn entry_exit_ratio(&self) -> f64 {
        self.entry_speed / self.exit_speed
    }

    /// Apex speed over the faster of entry and exit.
    pub fn speed_reduction(&self) -> f64 {
        self.apex_speed / self.entry_speed.max(self.exit_speed)
    }
}

/// Find significant corners.
///
/// An apex is a local speed minimum below `apex_speed_fraction` of the lap
/// maximum. Entry and exit are found by walking away from the apex while
/// speed does not drop, for at most `corner_window_bins` bins. A corner is
/// kept when entry or exit exceeds `significant_corner_ratio` × apex speed.
pub fn detect_corners(speed: &[f64], config: &ExtractorConfig) -> Vec<Corner> {
    let max_speed = speed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max_speed.is_finite() && max_speed > 0.0) {
        return Vec::new();
    }
    let ceiling = max_speed * config.apex_speed_fraction;

    let mut corners = Vec::new();
    for (offset, triple) in speed.windows(3).enumerate() {
        let [previous, apex_speed, next] = *triple else {
            continue;
        };
        let is_local_min = apex_speed <= previous && apex_speed < next;
        if !(is_local_min && apex_speed > 0.0 && apex_speed < ceiling) {
            continue;
        }

        let apex = offset + 1;
        let entry = walk(speed, apex, config.corner_window_bins, Direction::Backward);
        let exit = walk(speed, apex, config.corner_window_bins, Direction::Forward);
        let (Some(entry_speed), Some(exit_speed)) = (speed.get(entry), speed.get(exit)) else {
            continue;
        };

        if entry_speed.max(*exit_speed) > config.significant_corner_ratio * apex_speed {
            corners.push(Corner {
                apex,
                entry,
                exit,
                apex_speed,
                entry_speed: *entry_speed,
                exit_speed: *exit_speed,
            });
        }
    }
    corners
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Backward,
    Forward,
}

fn walk(speed: &[f64], apex: usize, window: usize, direction: Direction) -> usize {
    let mut at = apex;
    for _ in 0..window {
        let next = match direction {
            Direction::Backward => at.checked_sub(1),
            Direction::Forward => at.checked_add(1),
        };
        let (Some(next), Some(current)) = (next, speed.get(at)) else {
            break;
        };
        match speed.get(next) {
            Some(v) if v >= current => at = next,
            _ => break,
        }
    }
    at
}

/// First bin of the braking zone that leads into `apex`.
///
/// The latest bin at or above `threshold` is searched for within `window`
/// bins before the apex, never crossing `lower_bound`. The onset is the
/// start of that braking run. `None` when the corner is taken without
/// braking.
pub fn brake_onset(
    brake: &[f64],
    apex: usize,
    lower_bound: usize,
    window: usize,
    threshold: f64,
) -> Option<usize> {
    let is_braking = |j: usize| brake.get(j).is_some_and(|b| *b >= threshold);
    let search_start = apex.saturating_sub(window).max(lower_bound);
    let last_on = (search_start..=apex).rev().find(|j| is_braking(*j))?;

    let mut onset = last_on;
    while onset > lower_bound && is_braking(onset - 1) {
        onset -= 1;
    }
    Some(onset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            corner_window_bins: 10,
            ..ExtractorConfig::default()
        }
    }

    #[test]
    fn test_single_v_corner() {
        let speed = [80.0, 70.0, 50.0, 30.0, 50.0, 70.0, 80.0];
        let corners = detect_corners(&speed, &config());
        assert_eq!(corners.len(), 1);
        let corner = corners.first().copied();
        assert_eq!(corner.map(|c| (c.apex, c.entry, c.exit)), Some((3, 0, 6)));
        assert!(corner.is_some_and(|c| (c.speed_reduction() - 0.375).abs() < 1e-12));
    }

    #[test]
    fn test_fast_dip_is_not_a_corner() {
        // minimum above 70% of max speed
        let speed = [80.0, 75.0, 70.0, 75.0, 80.0];
        assert!(detect_corners(&speed, &config()).is_empty());
    }

    #[test]
    fn test_shallow_dip_is_not_significant() {
        let speed = [80.0, 50.0, 45.0, 44.0, 45.0, 50.0, 80.0];
        let narrow = ExtractorConfig {
            corner_window_bins: 1,
            ..ExtractorConfig::default()
        };
        assert!(detect_corners(&speed, &narrow).is_empty());
        assert_eq!(detect_corners(&speed, &config()).len(), 1);
    }

    #[test]
    fn test_brake_onset_walks_to_start_of_run() {
        let brake = [0.0, 0.0, 0.5, 0.9, 0.9, 0.2, 0.0, 0.0];
        assert_eq!(brake_onset(&brake, 6, 0, 3, 0.1), Some(2));
        assert_eq!(brake_onset(&brake, 6, 3, 3, 0.1), Some(3));
        assert_eq!(brake_onset(&brake, 7, 0, 1, 0.1), None);
    }
}
