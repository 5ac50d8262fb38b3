//! GPX route loading and export.
//!
//! Routes are projected onto the scene's ground plane with an equirectangular
//! approximation around the first point, which is accurate enough for the
//! few hundred metres a walking track spans. X points east, Z points north.

use std::path::Path;

use geo::Point;
use glam::Vec3;
use gpx::{Gpx, read};
use pathwalker::Waypoint;
use thiserror::Error;

use crate::sources::procedural::orient;

const EARTH_RADIUS_CM: f64 = 637_100_000.0;

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPX parse error: {0}")]
    Parse(#[from] gpx::errors::GpxError),
    #[error("No tracks found in GPX file")]
    NoTracks,
    #[error("No track segments found")]
    NoSegments,
}

/// A route in scene coordinates plus the geographic point it is anchored to.
#[derive(Debug, Clone)]
pub struct LocalRoute {
    /// Geographic position of the scene origin.
    pub origin: Point<f64>,
    pub waypoints: Vec<Waypoint>,
}

/// Loads walking routes from GPX files.
pub struct GpxLoader;

impl GpxLoader {
    /// Loads a route from a GPX file.
    ///
    /// All points from all tracks and segments are flattened into one route.
    pub fn load_file(path: impl AsRef<Path>) -> Result<LocalRoute, GpxError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let gpx: Gpx = read(reader)?;

        Self::extract_route(&gpx)
    }

    /// Loads a route from GPX data in memory.
    pub fn load_bytes(data: &[u8]) -> Result<LocalRoute, GpxError> {
        let reader = std::io::Cursor::new(data);
        let gpx: Gpx = read(reader)?;

        Self::extract_route(&gpx)
    }

    fn extract_route(gpx: &Gpx) -> Result<LocalRoute, GpxError> {
        if gpx.tracks.is_empty() {
            return Err(GpxError::NoTracks);
        }

        let points: Vec<Point<f64>> = gpx
            .tracks
            .iter()
            .flat_map(|track| &track.segments)
            .flat_map(|segment| &segment.points)
            .map(|waypoint| waypoint.point())
            .collect();

        let Some(&origin) = points.first() else {
            return Err(GpxError::NoSegments);
        };

        let local = points.iter().map(|p| to_local(origin, *p)).collect();
        Ok(LocalRoute {
            origin,
            waypoints: orient(local),
        })
    }

    /// Writes waypoints to a GPX file, anchoring the scene origin at `origin`.
    ///
    /// Useful for viewing generated paths in mapping tools.
    pub fn write_file(
        path: impl AsRef<Path>,
        origin: Point<f64>,
        waypoints: &[Waypoint],
        name: Option<&str>,
    ) -> Result<(), GpxError> {
        use gpx::{GpxVersion, Track, TrackSegment};

        let points = waypoints
            .iter()
            .map(|w| gpx::Waypoint::new(to_geographic(origin, w.position)))
            .collect();

        let mut track = Track::new();
        track.name = name.map(String::from);
        track.segments = vec![TrackSegment { points }];

        let gpx = Gpx {
            version: GpxVersion::Gpx11,
            tracks: vec![track],
            ..Default::default()
        };

        let file = std::fs::File::create(path)?;
        gpx::write(&gpx, file)?;

        Ok(())
    }
}

/// Ground position in cm of `point` relative to `origin`.
pub fn to_local(origin: Point<f64>, point: Point<f64>) -> Vec3 {
    let lat0 = origin.y().to_radians();
    let east = (point.x() - origin.x()).to_radians() * lat0.cos() * EARTH_RADIUS_CM;
    let north = (point.y() - origin.y()).to_radians() * EARTH_RADIUS_CM;
    Vec3::new(east as f32, 0.0, north as f32)
}

/// Inverse of [`to_local`].
pub fn to_geographic(origin: Point<f64>, local: Vec3) -> Point<f64> {
    let lat0 = origin.y().to_radians();
    let lat = origin.y() + (local.z as f64 / EARTH_RADIUS_CM).to_degrees();
    let lon = origin.x() + (local.x as f64 / (EARTH_RADIUS_CM * lat0.cos())).to_degrees();
    Point::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOULDER: (f64, f64) = (-105.27, 40.015);

    #[test]
    fn test_local_projection_scale() {
        let origin = Point::new(BOULDER.0, BOULDER.1);
        // 0.001 degrees of latitude is ~111 m
        let north = to_local(origin, Point::new(BOULDER.0, BOULDER.1 + 0.001));
        assert!((north.z - 11_119.5).abs() < 10.0, "north was {}", north.z);
        assert!(north.x.abs() < 1e-3);

        let back = to_geographic(origin, north);
        assert!((back.y() - (BOULDER.1 + 0.001)).abs() < 1e-7);
    }

    #[test]
    fn test_write_then_load() {
        let origin = Point::new(BOULDER.0, BOULDER.1);
        let waypoints = orient(vec![
            Vec3::ZERO,
            Vec3::new(5_000.0, 0.0, 0.0),
            Vec3::new(5_000.0, 0.0, 5_000.0),
        ]);

        let temp_path = std::env::temp_dir().join("pathwalker_test_route.gpx");
        GpxLoader::write_file(&temp_path, origin, &waypoints, Some("Test Route")).unwrap();

        let route = GpxLoader::load_file(&temp_path).unwrap();
        assert_eq!(route.waypoints.len(), 3);
        for (loaded, written) in route.waypoints.iter().zip(&waypoints) {
            assert!(loaded.position.distance(written.position) < 5.0);
        }

        // Clean up
        std::fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_empty_gpx_is_rejected() {
        let gpx = Gpx {
            version: gpx::GpxVersion::Gpx11,
            ..Default::default()
        };
        assert!(matches!(
            GpxLoader::extract_route(&gpx),
            Err(GpxError::NoTracks)
        ));
    }
}
