use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// An authored point of the walking path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Waypoint {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Waypoint with identity orientation.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Lifecycle of a walking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Inactive,
    Prep,
    Walking,
    Finished,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::Prep => "prep",
            SessionState::Walking => "walking",
            SessionState::Finished => "finished",
        }
    }

    /// States in which the start boundary is listened to.
    pub fn accepts_start_boundary(&self) -> bool {
        matches!(self, SessionState::Prep | SessionState::Walking)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which view the presenter shows while the UI is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationStage {
    #[default]
    None,
    GoToStart,
    Walking,
}

/// The two trigger zones of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryEdge {
    Start,
    Finish,
}

impl fmt::Display for BoundaryEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryEdge::Start => f.write_str("start"),
            BoundaryEdge::Finish => f.write_str("finish"),
        }
    }
}

/// One reading from the pace source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaceSample {
    pub normalized_position: Vec3,
    /// Instantaneous speed in world units per second.
    pub pace: f32,
    pub distance_delta: f32,
    pub time_delta: f32,
}

/// Position and orientation of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sound {
    StartWalkPath,
    StartLap,
    CompleteLap,
}

impl Sound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sound::StartWalkPath => "startWalkPath",
            Sound::StartLap => "onStartLap",
            Sound::CompleteLap => "onCompleteLap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardCategory {
    LapTime,
    Distance,
}

/// Ranking direction of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    LowerIsBetter,
    HigherIsBetter,
}

impl LeaderboardCategory {
    pub fn ordering(&self) -> OrderingPolicy {
        match self {
            LeaderboardCategory::LapTime => OrderingPolicy::LowerIsBetter,
            LeaderboardCategory::Distance => OrderingPolicy::HigherIsBetter,
        }
    }
}

/// Identifies a board on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardOptions {
    pub name: String,
    pub category: LeaderboardCategory,
    pub ordering: OrderingPolicy,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub session_id: Uuid,
    pub board: BoardOptions,
    pub score: i64,
    pub submitted_at: OffsetDateTime,
}

/// Entry returned by the backend after a submission or a personal best lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub display_name: Option<String>,
    pub score: i64,
}
