//! Walker profile.

use super::AthleteProfile;

/// Profile for walking the track.
///
/// Based on typical adult walking speeds:
/// - Base speed: ~5 km/h (1.4 m/s)
/// - Larger day-to-day variance than running
#[derive(Debug, Clone)]
pub struct WalkerProfile {
    /// Base speed in m/s.
    base_speed: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
}

impl Default for WalkerProfile {
    fn default() -> Self {
        Self {
            base_speed: 1.4, // ~5 km/h
            variance: 0.12,
        }
    }
}

impl WalkerProfile {
    /// Creates a walker profile with the specified base speed.
    ///
    /// # Arguments
    /// * `speed_kmh` - Base speed in km/h
    pub fn with_speed(speed_kmh: f64) -> Self {
        let base_speed = speed_kmh / 3.6;
        Self {
            base_speed,
            ..Default::default()
        }
    }

    /// Creates a brisk walker profile (~6.5 km/h base).
    pub fn brisk() -> Self {
        Self::with_speed(6.5)
    }

    /// Creates a leisurely walker profile (~3.5 km/h base).
    pub fn leisurely() -> Self {
        Self::with_speed(3.5)
    }
}

impl AthleteProfile for WalkerProfile {
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
    fn test_speed_presets() {
        let default = WalkerProfile::default();
        assert!(WalkerProfile::brisk().base_speed_mps() > default.base_speed_mps());
        assert!(WalkerProfile::leisurely().base_speed_mps() < default.base_speed_mps());
        assert!((WalkerProfile::with_speed(3.6).base_speed_mps() - 1.0).abs() < 1e-9);
    }
}
