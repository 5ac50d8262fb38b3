//! Configuration types for simulated sessions.
//!
//! World units follow the scene: centimetres on the ground plane (X/Z), Y up.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Ground rectangle that generated paths stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl ArenaBounds {
    pub const fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// Square of side `2 * half_extent` around the origin.
    pub const fn centered(half_extent: f32) -> Self {
        Self::new(-half_extent, -half_extent, half_extent, half_extent)
    }

    /// A park-sized arena, 200 m on each side.
    pub const PARK: ArenaBounds = ArenaBounds::centered(10_000.0);

    /// A backyard-sized arena, 30 m on each side.
    pub const YARD: ArenaBounds = ArenaBounds::centered(1_500.0);

    pub fn contains(&self, point: Vec3) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_z..=self.max_z).contains(&point.z)
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min_x + self.max_x) / 2.0,
            0.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }

    /// Returns a random ground point within the bounds.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> Vec3 {
        let x = rng.gen_range(self.min_x..self.max_x);
        let z = rng.gen_range(self.min_z..self.max_z);
        Vec3::new(x, 0.0, z)
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::PARK
    }
}

/// Parameters shared by every simulated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the scenario's random number generator.
    pub seed: u64,
    /// Frame rate of the simulated device.
    pub frame_rate_hz: f32,
    /// Standard deviation of the tracked position noise, in cm.
    pub position_jitter_cm: f32,
    /// Distance walked before the first and after the last waypoint, in cm.
    pub lead_cm: f32,
    /// Trigger zone depth along the marker's facing direction, each side.
    pub trigger_half_depth_cm: f32,
    /// Trigger zone width across the track, each side.
    pub trigger_half_width_cm: f32,
    pub bounds: ArenaBounds,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            frame_rate_hz: 30.0,
            position_jitter_cm: 1.5,
            lead_cm: 150.0,
            trigger_half_depth_cm: 50.0,
            trigger_half_width_cm: 200.0,
            bounds: ArenaBounds::default(),
        }
    }
}

impl SimulationConfig {
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate_hz
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contain_random_points() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        let bounds = ArenaBounds::YARD;
        for _ in 0..100 {
            assert!(bounds.contains(bounds.random_point(&mut rng)));
        }
        assert_eq!(bounds.center(), Vec3::ZERO);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig = serde_json::from_str(r#"{"seed": 9}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.frame_rate_hz, 30.0);
        assert!((config.frame_dt() - 1.0 / 30.0).abs() < 1e-6);
    }
}
