//! Procedural path generation.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use pathwalker::{Waypoint, animator::look_rotation};
use rand::Rng;

use crate::config::ArenaBounds;

/// Configuration for procedural path generation.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Approximate distance between waypoints in cm.
    pub waypoint_spacing_cm: f32,
    /// Largest heading change between random walk steps, in radians.
    pub max_turn: f32,
    /// Ground area the random walk stays in.
    pub bounds: ArenaBounds,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            waypoint_spacing_cm: 500.0,
            max_turn: 0.3,
            bounds: ArenaBounds::default(),
        }
    }
}

/// Generates walkable paths as oriented waypoints.
///
/// Every waypoint faces the next one, the last faces along the final segment,
/// so a marker placed on the first or last waypoint looks along the track.
#[derive(Debug, Clone, Default)]
pub struct PathGenerator {
    config: PathConfig,
}

impl PathGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator for a specific arena.
    pub fn for_bounds(bounds: ArenaBounds) -> Self {
        Self {
            config: PathConfig {
                bounds,
                ..Default::default()
            },
        }
    }

    /// Sets waypoint spacing.
    pub fn with_spacing(mut self, cm: f32) -> Self {
        self.config.waypoint_spacing_cm = cm;
        self
    }

    /// Sets the largest heading change per random walk step.
    pub fn with_max_turn(mut self, radians: f32) -> Self {
        self.config.max_turn = radians;
        self
    }

    /// A straight sprint of `length_cm` from `start` along `heading`.
    pub fn straight(&self, start: Vec3, heading: f32, length_cm: f32) -> Vec<Waypoint> {
        let direction = heading_direction(heading);
        let steps = ((length_cm / self.config.waypoint_spacing_cm).ceil() as usize).max(1);
        let points = (0..=steps)
            .map(|i| start + direction * (length_cm * i as f32 / steps as f32))
            .collect();
        orient(points)
    }

    /// A closed circle; the last waypoint repeats the first.
    pub fn circle_loop(&self, center: Vec3, radius_cm: f32) -> Vec<Waypoint> {
        let circumference = TAU * radius_cm;
        let steps = ((circumference / self.config.waypoint_spacing_cm).ceil() as usize).max(3);
        let mut points: Vec<Vec3> = (0..steps)
            .map(|i| {
                let angle = TAU * i as f32 / steps as f32;
                center + Vec3::new(radius_cm * angle.cos(), 0.0, radius_cm * angle.sin())
            })
            .collect();
        points.push(points[0]);
        orient(points)
    }

    /// A random walk of roughly `length_cm` starting at `start`.
    ///
    /// The heading drifts with momentum and bounces off the arena bounds.
    pub fn random_walk(&self, start: Vec3, length_cm: f32, rng: &mut impl Rng) -> Vec<Waypoint> {
        let mut points = vec![start];
        let mut current = start;
        let mut total_distance = 0.0;

        // Random walk with some momentum to create natural-looking paths
        let mut heading = rng.gen_range(0.0..TAU);

        while total_distance < length_cm {
            let max_turn = self.config.max_turn;
            if max_turn > 0.0 {
                heading += rng.gen_range(-max_turn..max_turn);
            }

            // Roughly the configured spacing, with variance
            let step = self.config.waypoint_spacing_cm * rng.gen_range(0.8..1.2);
            let next = current + heading_direction(heading) * step;

            let (next, bounced_heading) = self.apply_bounds(next, heading);
            heading = bounced_heading;

            current = next;
            points.push(current);
            total_distance += step;
        }

        orient(points)
    }

    /// Applies bounds checking with heading reflection.
    fn apply_bounds(&self, point: Vec3, heading: f32) -> (Vec3, f32) {
        let b = &self.config.bounds;
        let margin = self.config.waypoint_spacing_cm;
        let mut new_heading = heading;

        let x = if point.x < b.min_x {
            new_heading = PI - new_heading;
            b.min_x + (b.min_x - point.x).min(margin)
        } else if point.x > b.max_x {
            new_heading = PI - new_heading;
            b.max_x - (point.x - b.max_x).min(margin)
        } else {
            point.x
        };

        let z = if point.z < b.min_z {
            new_heading = -new_heading;
            b.min_z + (b.min_z - point.z).min(margin)
        } else if point.z > b.max_z {
            new_heading = -new_heading;
            b.max_z - (point.z - b.max_z).min(margin)
        } else {
            point.z
        };

        (Vec3::new(x, point.y, z), new_heading)
    }
}

/// Unit ground direction for a heading measured from +X towards +Z.
pub fn heading_direction(heading: f32) -> Vec3 {
    Vec3::new(heading.cos(), 0.0, heading.sin())
}

/// Turns points into waypoints facing the direction of travel.
pub fn orient(points: Vec<Vec3>) -> Vec<Waypoint> {
    let mut rotation = Quat::IDENTITY;
    let mut waypoints = Vec::with_capacity(points.len());

    for (i, &position) in points.iter().enumerate() {
        let forward = match (points.get(i + 1), i.checked_sub(1).map(|p| points[p])) {
            (Some(&next), _) => next - position,
            (None, Some(previous)) => position - previous,
            (None, None) => Vec3::ZERO,
        };
        if let Some(facing) = look_rotation(forward, Vec3::Y) {
            rotation = facing;
        }
        waypoints.push(Waypoint::new(position, rotation));
    }

    waypoints
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn positions(waypoints: &[Waypoint]) -> Vec<Vec3> {
        waypoints.iter().map(|w| w.position).collect()
    }

    #[test]
    fn test_straight_sprint() {
        let generator = PathGenerator::new().with_spacing(1000.0);
        let path = generator.straight(Vec3::ZERO, 0.0, 10_000.0);

        assert_eq!(path.len(), 11);
        assert_eq!(path[0].position, Vec3::ZERO);
        assert!(path[10].position.distance(Vec3::new(10_000.0, 0.0, 0.0)) < 1e-2);
        assert!((pathwalker::geometry::path_length(&positions(&path)) - 10_000.0).abs() < 1.0);

        // Markers on either end look down the track.
        for waypoint in [path[0], path[10]] {
            assert!((waypoint.rotation * Vec3::Z).distance(Vec3::X) < 1e-4);
        }
    }

    #[test]
    fn test_circle_loop_closes() {
        let path = PathGenerator::new().circle_loop(Vec3::ZERO, 2_000.0);

        assert!(path.len() > 4);
        assert_eq!(path.first().unwrap().position, path.last().unwrap().position);
        for waypoint in &path {
            assert!((waypoint.position.length() - 2_000.0).abs() < 1e-1);
        }
    }

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(12345);
        let bounds = ArenaBounds::YARD;
        let generator = PathGenerator::for_bounds(bounds).with_spacing(200.0);

        let path = generator.random_walk(bounds.center(), 20_000.0, &mut rng);

        assert!(path.len() > 50);
        for waypoint in &path {
            assert!(bounds.contains(waypoint.position));
        }
    }

    #[test]
    fn test_random_walk_is_reproducible() {
        let generator = PathGenerator::new();
        let mut a = rand::rngs::StdRng::seed_from_u64(1);
        let mut b = rand::rngs::StdRng::seed_from_u64(1);

        assert_eq!(
            generator.random_walk(Vec3::ZERO, 5_000.0, &mut a),
            generator.random_walk(Vec3::ZERO, 5_000.0, &mut b)
        );
    }
}
