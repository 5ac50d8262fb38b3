//! Runner profile.

use super::AthleteProfile;

/// Profile for running the track.
///
/// Based on typical recreational to competitive runner performance:
/// - Base pace: ~5:00/km (3.5 m/s)
/// - An elite sprint crosses the over-speed warning (15 mph, ~6.7 m/s)
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    /// Base speed in m/s.
    base_speed: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.5, // ~5:00/km
            variance: 0.08,
        }
    }
}

impl RunnerProfile {
    /// Creates a runner profile with the specified base pace.
    ///
    /// # Arguments
    /// * `pace_min_per_km` - Base pace in minutes per kilometer (e.g., 5.0 for 5:00/km)
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        let base_speed = 1000.0 / (pace_min_per_km * 60.0);
        Self {
            base_speed,
            ..Default::default()
        }
    }

    /// Creates a recreational runner profile (~6:00/km base pace).
    pub fn recreational() -> Self {
        Self::with_pace(6.0)
    }

    /// Creates a sprinter profile (~7.5 m/s), fast enough to trip the
    /// over-speed warning.
    pub fn sprinter() -> Self {
        Self {
            base_speed: 7.5,
            variance: 0.04,
        }
    }
}

impl AthleteProfile for RunnerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = RunnerProfile::default();
        assert!((profile.base_speed_mps() - 3.5).abs() < 0.01);
    }

    #[test]
    fn test_pace_conversion() {
        let profile = RunnerProfile::with_pace(5.0);
        assert!((profile.base_speed_mps() - 3.333).abs() < 0.01);
        assert!(RunnerProfile::recreational().base_speed_mps() < profile.base_speed_mps());
    }

    #[test]
    fn test_sprinter_exceeds_warning_speed() {
        let speed = RunnerProfile::sprinter().base_speed_cms() as f32;
        assert!(speed * pathwalker::config::CM_PER_SEC_TO_MPH > 15.0);
    }
}
