//! Simulated walkers for pathwalker.
//!
//! This crate generates walking paths and frame-by-frame device traces, and
//! replays them against a headless session to exercise lap timing, progress
//! and leaderboard submission without a scene.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let result = ScenarioBuilder::new()
//!     .looped(1_500.0)
//!     .with_profile(WalkerProfile::brisk())
//!     .with_seed(12345)
//!     .run()
//!     .await?;
//! println!("{} laps, {}cm", result.lap_count, result.distance_cm);
//! ```

pub mod builders;
pub mod config;
pub mod generators;
pub mod profiles;
pub mod sources;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{
        ScenarioBuilder, ScenarioError, ScenarioMetrics, ScenarioResult, TrackShape,
    };
    pub use crate::config::{ArenaBounds, SimulationConfig};
    pub use crate::generators::{
        BoundaryEvent, BoundaryPlane, TraceConfig, TraceFrame, TraceGenerator, detect_exits,
    };
    pub use crate::profiles::{
        AthleteProfile, RunnerProfile, WalkerProfile, sample_variance, session_speed_cms,
    };
    pub use crate::sources::{GpxLoader, LocalRoute, PathGenerator};
}
