//! Frame-by-frame walker traces and trigger zone crossings.

use glam::Vec3;
use pathwalker::{BoundaryEdge, Waypoint, geometry::path_length};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::profiles::{self, AthleteProfile};

/// One device frame of a simulated walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceFrame {
    /// Seconds since the first frame.
    pub time: f64,
    /// Frame delta in seconds.
    pub dt: f32,
    /// Tracked ground position, noise included.
    pub position: Vec3,
}

/// Configuration for trace generation.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub frame_dt: f32,
    /// Position noise standard deviation in cm.
    pub jitter_cm: f32,
    /// Distance walked before the path start and past the path end, in cm.
    pub lead_cm: f32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            frame_dt: 1.0 / 30.0,
            jitter_cm: 1.5,
            lead_cm: 150.0,
        }
    }
}

/// Walks a path at a profile's speed and samples the tracked position once
/// per frame.
pub struct TraceGenerator {
    config: TraceConfig,
}

impl TraceGenerator {
    pub fn new() -> Self {
        Self {
            config: TraceConfig::default(),
        }
    }

    pub fn with_config(config: TraceConfig) -> Self {
        Self { config }
    }

    pub fn from_simulation(config: &SimulationConfig) -> Self {
        Self::with_config(TraceConfig {
            frame_dt: config.frame_dt(),
            jitter_cm: config.position_jitter_cm,
            lead_cm: config.lead_cm,
        })
    }

    /// Generates the frames of one walk along `path`, lead-in and lead-out
    /// included. Paths with fewer than two points produce no frames.
    pub fn generate(
        &self,
        path: &[Vec3],
        profile: &dyn AthleteProfile,
        rng: &mut impl Rng,
    ) -> Vec<TraceFrame> {
        if path.len() < 2 || self.config.frame_dt <= 0.0 {
            return Vec::new();
        }

        let variance = profiles::sample_variance(profile, rng);
        let speed = profiles::session_speed_cms(profile, variance) as f32;
        let step = speed * self.config.frame_dt;

        let route = self.with_leads(path);
        let total = path_length(&route);
        let jitter = Normal::new(0.0_f32, self.config.jitter_cm)
            .ok()
            .filter(|_| self.config.jitter_cm > 0.0);

        let mut frames = Vec::with_capacity((total / step) as usize + 2);
        let mut travelled = 0.0_f32;
        let mut time = 0.0_f64;

        loop {
            let mut position = point_at_distance(&route, travelled);
            if let Some(noise) = &jitter {
                position.x += noise.sample(rng);
                position.z += noise.sample(rng);
            }
            frames.push(TraceFrame {
                time,
                dt: self.config.frame_dt,
                position,
            });

            if travelled >= total {
                break;
            }
            travelled = (travelled + step).min(total);
            time += self.config.frame_dt as f64;
        }

        frames
    }

    fn with_leads(&self, path: &[Vec3]) -> Vec<Vec3> {
        let n = path.len();
        let first_direction = (path[1] - path[0]).normalize_or_zero();
        let last_direction = (path[n - 1] - path[n - 2]).normalize_or_zero();

        let mut route = Vec::with_capacity(n + 2);
        route.push(path[0] - first_direction * self.config.lead_cm);
        route.extend_from_slice(path);
        route.push(path[n - 1] + last_direction * self.config.lead_cm);
        route
    }
}

impl Default for TraceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Point at `distance` along the polyline, clamped to its ends.
pub fn point_at_distance(points: &[Vec3], distance: f32) -> Vec3 {
    let Some(&first) = points.first() else {
        return Vec3::ZERO;
    };

    let mut remaining = distance.max(0.0);
    for pair in points.windows(2) {
        let length = pair[0].distance(pair[1]);
        if remaining <= length {
            if length <= f32::EPSILON {
                return pair[1];
            }
            return pair[0].lerp(pair[1], remaining / length);
        }
        remaining -= length;
    }

    points.last().copied().unwrap_or(first)
}

/// Trigger zone around a start or finish marker: a box on the ground centred on
/// the marker, deep along its facing direction and wide across the track.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryPlane {
    pub edge: BoundaryEdge,
    origin: Vec3,
    normal: Vec3,
    half_depth: f32,
    half_width: f32,
}

impl BoundaryPlane {
    pub fn new(
        edge: BoundaryEdge,
        origin: Vec3,
        facing: Vec3,
        half_depth: f32,
        half_width: f32,
    ) -> Self {
        let normal = Vec3::new(facing.x, 0.0, facing.z)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        Self {
            edge,
            origin,
            normal,
            half_depth,
            half_width,
        }
    }

    /// Zone for a marker placed on `waypoint`, facing along its local +Z.
    pub fn from_waypoint(
        edge: BoundaryEdge,
        waypoint: &Waypoint,
        config: &SimulationConfig,
    ) -> Self {
        Self::new(
            edge,
            waypoint.position,
            waypoint.rotation * Vec3::Z,
            config.trigger_half_depth_cm,
            config.trigger_half_width_cm,
        )
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let offset = point - self.origin;
        let along = offset.dot(self.normal);
        let across = offset - self.normal * along;
        let lateral = Vec3::new(across.x, 0.0, across.z).length();
        along.abs() <= self.half_depth && lateral <= self.half_width
    }

    /// Movement direction dotted with the facing direction when the step from
    /// `previous` to `next` leaves the zone.
    pub fn exit_dot(&self, previous: Vec3, next: Vec3) -> Option<f32> {
        if !self.contains(previous) || self.contains(next) {
            return None;
        }
        Some((next - previous).normalize_or_zero().dot(self.normal))
    }
}

/// A trigger zone exit found in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryEvent {
    /// Index of the first frame outside the zone.
    pub frame: usize,
    pub edge: BoundaryEdge,
    pub dot: f32,
}

/// Every zone exit in `frames`, in frame order.
pub fn detect_exits(frames: &[TraceFrame], zones: &[BoundaryPlane]) -> Vec<BoundaryEvent> {
    frames
        .windows(2)
        .enumerate()
        .flat_map(move |(i, pair)| {
            zones.iter().filter_map(move |zone| {
                zone.exit_dot(pair[0].position, pair[1].position)
                    .map(|dot| BoundaryEvent {
                        frame: i + 1,
                        edge: zone.edge,
                        dot,
                    })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::profiles::RunnerProfile;

    fn sprint() -> Vec<Vec3> {
        vec![Vec3::ZERO, Vec3::new(5_000.0, 0.0, 0.0), Vec3::new(10_000.0, 0.0, 0.0)]
    }

    fn zone(edge: BoundaryEdge, x: f32) -> BoundaryPlane {
        BoundaryPlane::new(edge, Vec3::new(x, 0.0, 0.0), Vec3::X, 50.0, 200.0)
    }

    #[test]
    fn test_trace_covers_path_with_leads() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(12345);
        let generator = TraceGenerator::with_config(TraceConfig {
            jitter_cm: 0.0,
            ..Default::default()
        });

        let frames = generator.generate(&sprint(), &RunnerProfile::default(), &mut rng);

        let first = frames.first().unwrap();
        let last = frames.last().unwrap();
        assert_eq!(first.position, Vec3::new(-150.0, 0.0, 0.0));
        assert!(last.position.distance(Vec3::new(10_150.0, 0.0, 0.0)) < 1e-2);

        // ~3.5 m/s over 103 m takes around 30 s
        assert!((20.0..45.0).contains(&last.time), "took {}s", last.time);
        for pair in frames.windows(2) {
            assert!(pair[1].position.x >= pair[0].position.x);
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn test_degenerate_path_has_no_frames() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let frames =
            TraceGenerator::new().generate(&[Vec3::ZERO], &RunnerProfile::default(), &mut rng);
        assert!(frames.is_empty());
    }

    #[test]
    fn test_point_at_distance() {
        let points = sprint();
        assert_eq!(point_at_distance(&points, -5.0), Vec3::ZERO);
        assert_eq!(point_at_distance(&points, 7_500.0), Vec3::new(7_500.0, 0.0, 0.0));
        assert_eq!(point_at_distance(&points, 1e9), Vec3::new(10_000.0, 0.0, 0.0));
        assert_eq!(point_at_distance(&[], 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_zone_exit_direction() {
        let start = zone(BoundaryEdge::Start, 0.0);

        let forward = start.exit_dot(Vec3::new(40.0, 0.0, 0.0), Vec3::new(60.0, 0.0, 0.0));
        assert!(forward.unwrap() > 0.99);

        let backward = start.exit_dot(Vec3::new(-40.0, 0.0, 0.0), Vec3::new(-60.0, 0.0, 0.0));
        assert!(backward.unwrap() < -0.99);

        // Entering or staying outside is not an exit.
        assert!(start.exit_dot(Vec3::new(60.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0)).is_none());
        assert!(start.exit_dot(Vec3::new(0.0, 0.0, 300.0), Vec3::new(0.0, 0.0, 320.0)).is_none());
        assert!((start.signed_distance(Vec3::new(25.0, 0.0, 9.0)) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_detect_exits_through_sprint() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(12345);
        let generator = TraceGenerator::with_config(TraceConfig {
            jitter_cm: 0.0,
            ..Default::default()
        });
        let frames = generator.generate(&sprint(), &RunnerProfile::default(), &mut rng);

        let events = detect_exits(
            &frames,
            &[zone(BoundaryEdge::Start, 0.0), zone(BoundaryEdge::Finish, 10_000.0)],
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].edge, BoundaryEdge::Start);
        assert_eq!(events[1].edge, BoundaryEdge::Finish);
        assert!(events.iter().all(|e| e.dot > 0.0));
        assert!(events[0].frame < events[1].frame);
    }
}
