//! Movement profiles for simulated walkers.
//!
//! Profiles define realistic ground speeds for different kinds of movement.
//! They are used by the trace generator to place the walker frame by frame.

mod runner;
mod walker;

pub use runner::RunnerProfile;
pub use walker::WalkerProfile;

/// Trait for movement profiles.
pub trait AthleteProfile: Send + Sync {
    /// Typical ground speed in metres per second.
    fn base_speed_mps(&self) -> f64;

    /// Session-to-session performance variance as a coefficient of variation
    /// (0.0 - 1.0).
    fn variance(&self) -> f64;

    /// Ground speed in scene units (cm per second).
    fn base_speed_cms(&self) -> f64 {
        self.base_speed_mps() * 100.0
    }
}

/// Speed for one session in cm/s, given a sampled variance factor.
pub fn session_speed_cms(profile: &dyn AthleteProfile, variance_factor: f64) -> f64 {
    // Never slower than a shuffle
    (profile.base_speed_cms() * variance_factor).max(30.0)
}

/// Samples a variance factor from a normal distribution around 1.0.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => {
            let sample: f64 = normal.sample(rng);
            sample.clamp(0.7, 1.4)
        }
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_variance_is_clamped() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let profile = WalkerProfile::default();
        for _ in 0..500 {
            let factor = sample_variance(&profile, &mut rng);
            assert!((0.7..=1.4).contains(&factor));
        }
    }

    #[test]
    fn test_session_speed_in_scene_units() {
        let profile = RunnerProfile::default();
        let speed = session_speed_cms(&profile, 1.0);
        assert!((speed - 350.0).abs() < 1e-9);
        assert_eq!(session_speed_cms(&profile, 0.0), 30.0);
    }
}
