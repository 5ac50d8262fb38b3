pub mod animator;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod headless;
pub mod leaderboard;
pub mod models;
pub mod progress;
pub mod session;
pub mod spline;
pub mod stats;

pub use crate::{
    collaborators::Collaborators,
    config::{AnimatorConfig, LeaderboardConfig, SessionConfig},
    errors::{LeaderboardError, PathError},
    leaderboard::{LeaderboardClient, LeaderboardSink},
    models::{BoundaryEdge, SessionState, Waypoint},
    session::{FinishedCallback, PathWalker},
};
