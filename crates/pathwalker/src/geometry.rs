//! Path geometry owned by a session.
//!
//! Three point orders are kept side by side:
//! - the spline waypoints, which reverse on a full track swap,
//! - the display points used for the mesh and arrows, which reverse on every
//!   visual flip,
//! - the animation path, which keeps the authored start-to-finish order for the
//!   whole session.

use glam::Vec3;

use crate::{
    models::{BoundaryEdge, Waypoint},
    spline::CatmullRomSpline,
};

#[derive(Debug, Clone, Default)]
pub struct PathGeometry {
    waypoints: Vec<Waypoint>,
    spline: CatmullRomSpline,
    display_points: Vec<Vec3>,
    animation_path: Vec<Vec3>,
    total_length: f32,
    is_loop: bool,
    is_forward: bool,
}

impl PathGeometry {
    /// An empty path, as held by an inactive session.
    pub fn empty() -> Self {
        Self {
            is_forward: true,
            ..Default::default()
        }
    }

    pub fn build_from(waypoints: Vec<Waypoint>, is_loop: bool) -> Self {
        let animation_path: Vec<Vec3> = waypoints.iter().map(|w| w.position).collect();
        let total_length = path_length(&animation_path);

        let mut display_points = animation_path.clone();
        display_points.reverse();

        let spline = CatmullRomSpline::new(animation_path.clone());

        Self {
            waypoints,
            spline,
            display_points,
            animation_path,
            total_length,
            is_loop,
            is_forward: true,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn display_points(&self) -> &[Vec3] {
        &self.display_points
    }

    pub fn animation_path(&self) -> &[Vec3] {
        &self.animation_path
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    pub fn is_forward(&self) -> bool {
        self.is_forward
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Whether the curve can be projected onto.
    pub fn is_projectable(&self) -> bool {
        self.waypoints.len() >= 2
    }

    /// Spline parameter closest to `position`, or `None` for degenerate paths.
    pub fn project(&self, position: Vec3) -> Option<f32> {
        if !self.is_projectable() {
            return None;
        }
        self.spline.project(position)
    }

    pub fn sample_position(&self, t: f32) -> Vec3 {
        self.spline.sample(t)
    }

    /// Display points in reverse, the order the arrow visualizer expects.
    pub fn arrow_points(&self) -> Vec<Vec3> {
        self.display_points.iter().rev().copied().collect()
    }

    /// Reverses the spline waypoints (full track swap).
    pub fn reverse_spline(&mut self) {
        self.waypoints.reverse();
        self.spline.reverse();
    }

    pub fn reverse_display(&mut self) {
        self.display_points.reverse();
    }

    /// Flips the traversal direction when `edge` disagrees with it.
    ///
    /// Leaving through the start while reversed, or through the finish while
    /// forward, flips. Returns whether a flip happened.
    pub fn flip_direction_for(&mut self, edge: BoundaryEdge) -> bool {
        let flip = match edge {
            BoundaryEdge::Start => !self.is_forward,
            BoundaryEdge::Finish => self.is_forward,
        };
        if flip {
            self.is_forward = !self.is_forward;
        }
        flip
    }
}

/// Sum of distances between consecutive points.
pub fn path_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}
