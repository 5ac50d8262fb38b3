use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Invalid geometry: {waypoints} waypoint(s), at least 2 required")]
    InvalidGeometry { waypoints: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a leaderboard backend.
///
/// Submission is best effort: these are logged and never change session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("Leaderboard unavailable: {0}")]
    Unavailable(String),

    #[error("Score rejected with status {status}")]
    Rejected { status: i32 },
}
