//! Generators for simulated device input.
//!
//! - [`TraceGenerator`]: Frame-sampled walker positions along a path
//! - [`BoundaryPlane`]: Trigger zones and the exits a trace produces

pub mod trace;

pub use trace::{
    BoundaryEvent, BoundaryPlane, TraceConfig, TraceFrame, TraceGenerator, detect_exits,
    point_at_distance,
};
