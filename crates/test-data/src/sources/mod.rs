//! Path sources for simulated sessions.
//!
//! - [`PathGenerator`]: Generate straight sprints, loops and random walks
//! - [`GpxLoader`]: Load real routes from GPX files

mod gpx_files;
mod procedural;

pub use gpx_files::{GpxError, GpxLoader, LocalRoute, to_geographic, to_local};
pub use procedural::{PathConfig, PathGenerator, heading_direction, orient};
