//! Catmull-Rom curve through the path waypoints.
//!
//! The curve is parameterized uniformly: `t ∈ [0, 1]` spans all segments, each
//! segment covering `1 / segment_count` of the range. Endpoints repeat the first
//! and last control point so the curve passes through both ends.

use glam::Vec3;

/// Samples taken per segment before refining the closest point.
const COARSE_SAMPLES: usize = 16;
/// Ternary-search iterations for the refinement step.
const REFINE_ITERATIONS: usize = 24;

/// Point on a single Catmull-Rom segment between `p1` and `p2`.
pub fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatmullRomSpline {
    points: Vec<Vec3>,
}

impl CatmullRomSpline {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Reverses the control points in place; `sample(t)` becomes `sample(1 - t)`.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Position at parameter `t` (clamped to `[0, 1]`).
    ///
    /// An empty curve yields the zero vector and a single point yields itself.
    pub fn sample(&self, t: f32) -> Vec3 {
        match self.points.len() {
            0 => Vec3::ZERO,
            1 => self.points[0],
            _ => {
                let (segment, local) = self.locate(t);
                self.sample_segment(segment, local)
            }
        }
    }

    /// Parameter of the curve point closest to `query`.
    ///
    /// Returns `None` for curves with fewer than two points.
    pub fn project(&self, query: Vec3) -> Option<f32> {
        let segments = self.segment_count();
        if segments == 0 {
            return None;
        }

        let mut best_segment = 0;
        let mut best_local = 0.0;
        let mut best_distance = f32::INFINITY;

        for segment in 0..segments {
            for step in 0..=COARSE_SAMPLES {
                let local = step as f32 / COARSE_SAMPLES as f32;
                let distance = self.sample_segment(segment, local).distance_squared(query);
                if distance < best_distance {
                    best_distance = distance;
                    best_segment = segment;
                    best_local = local;
                }
            }
        }

        let spacing = 1.0 / COARSE_SAMPLES as f32;
        let mut lo = (best_local - spacing).max(0.0);
        let mut hi = (best_local + spacing).min(1.0);
        for _ in 0..REFINE_ITERATIONS {
            let m1 = lo + (hi - lo) / 3.0;
            let m2 = hi - (hi - lo) / 3.0;
            let d1 = self.sample_segment(best_segment, m1).distance_squared(query);
            let d2 = self.sample_segment(best_segment, m2).distance_squared(query);
            if d1 < d2 {
                hi = m2;
            } else {
                lo = m1;
            }
        }
        let local = (lo + hi) / 2.0;

        Some(((best_segment as f32 + local) / segments as f32).clamp(0.0, 1.0))
    }

    /// Segment index and local parameter for a global `t`.
    fn locate(&self, t: f32) -> (usize, f32) {
        let segments = self.segment_count();
        let scaled = t.clamp(0.0, 1.0) * segments as f32;
        let segment = (scaled.floor() as usize).min(segments - 1);
        (segment, scaled - segment as f32)
    }

    fn sample_segment(&self, segment: usize, local: f32) -> Vec3 {
        let last = self.points.len() - 1;
        let p0 = self.points[segment.saturating_sub(1)];
        let p1 = self.points[segment];
        let p2 = self.points[(segment + 1).min(last)];
        let p3 = self.points[(segment + 2).min(last)];
        catmull_rom_point(p0, p1, p2, p3, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_line() -> CatmullRomSpline {
        CatmullRomSpline::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 100.0 / 3.0),
            Vec3::new(0.0, 0.0, 200.0 / 3.0),
            Vec3::new(0.0, 0.0, 100.0),
        ])
    }

    #[test]
    fn test_catmull_rom_endpoints() {
        let p0 = Vec3::new(0.0, 0.0, 0.0);
        let p1 = Vec3::new(1.0, 0.0, 0.0);
        let p2 = Vec3::new(2.0, 1.0, 0.0);
        let p3 = Vec3::new(3.0, 1.0, 0.0);
        assert!(catmull_rom_point(p0, p1, p2, p3, 0.0).distance(p1) < 1e-6);
        assert!(catmull_rom_point(p0, p1, p2, p3, 1.0).distance(p2) < 1e-6);
    }

    #[test]
    fn test_sample_passes_through_waypoints() {
        let spline = straight_line();
        assert!(spline.sample(0.0).distance(Vec3::ZERO) < 1e-4);
        assert!(spline.sample(1.0).distance(Vec3::new(0.0, 0.0, 100.0)) < 1e-4);
        assert!(spline.sample(1.0 / 3.0).distance(spline.points()[1]) < 1e-3);
    }

    #[test]
    fn test_project_on_straight_line() {
        let spline = straight_line();
        let t = spline.project(Vec3::new(5.0, 0.0, 50.0)).unwrap();
        assert!((t - 0.5).abs() < 0.01, "got {t}");

        let start = spline.project(Vec3::new(0.0, 0.0, -20.0)).unwrap();
        assert!(start < 0.01);

        let end = spline.project(Vec3::new(0.0, 0.0, 130.0)).unwrap();
        assert!(end > 0.99);
    }

    #[test]
    fn test_project_reversed() {
        let mut spline = straight_line();
        let query = Vec3::new(0.0, 0.0, 25.0);
        let forward = spline.project(query).unwrap();
        spline.reverse();
        let backward = spline.project(query).unwrap();
        assert!((forward + backward - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_degenerate_curves() {
        let empty = CatmullRomSpline::default();
        assert_eq!(empty.sample(0.5), Vec3::ZERO);
        assert!(empty.project(Vec3::ONE).is_none());

        let single = CatmullRomSpline::new(vec![Vec3::new(1.0, 2.0, 3.0)]);
        assert_eq!(single.sample(0.7), Vec3::new(1.0, 2.0, 3.0));
        assert!(single.project(Vec3::ONE).is_none());
    }
}
