//! Fluent builder for scripted walking sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use pathwalker::{
    BoundaryEdge, LeaderboardClient, PathError, PathWalker, SessionConfig, SessionState, Waypoint,
    collaborators::BoundaryMarker,
    headless::{HeadlessHost, HostEvent, MemoryLeaderboard},
    models::{LeaderboardCategory, ScoreSubmission},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{ArenaBounds, SimulationConfig};
use crate::generators::{BoundaryEvent, BoundaryPlane, TraceGenerator, detect_exits};
use crate::profiles::{AthleteProfile, RunnerProfile, WalkerProfile};
use crate::sources::{GpxError, GpxLoader, PathGenerator};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Gpx(#[from] GpxError),
    #[error("Generated trace has no frames")]
    EmptyTrace,
}

/// Where the track geometry comes from.
#[derive(Debug, Clone)]
pub enum TrackShape {
    /// Straight sprint along +X from the arena centre.
    Straight { length_cm: f32 },
    /// Closed circle around the arena centre.
    Loop { radius_cm: f32 },
    /// Random walk sprint from the arena centre.
    RandomWalk { length_cm: f32 },
    /// Route loaded from a GPX file.
    GpxFile { path: PathBuf, is_loop: bool },
    /// Explicit waypoints.
    Waypoints {
        waypoints: Vec<Waypoint>,
        is_loop: bool,
    },
}

/// Outcome of a simulated session.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub session_id: Uuid,
    pub state: SessionState,
    pub lap_count: i32,
    pub is_loop: bool,
    pub frames: usize,
    pub path_length_cm: f32,
    /// Ground distance walked inside the sprint zone.
    pub distance_cm: f32,
    /// Average raw pace in cm/s.
    pub average_pace: Option<f32>,
    pub lap_time_ms: Option<i64>,
    pub record_time: String,
    pub warning_shown: bool,
    pub ghost_arrived: bool,
    pub boundary_events: Vec<BoundaryEvent>,
    pub submissions: Vec<ScoreSubmission>,
    /// Metrics from the run (populated if metrics tracking enabled).
    pub metrics: Option<ScenarioMetrics>,
}

impl ScenarioResult {
    pub fn submissions_for(&self, category: LeaderboardCategory) -> Vec<&ScoreSubmission> {
        self.submissions
            .iter()
            .filter(|s| s.board.category == category)
            .collect()
    }
}

/// Performance metrics from a simulated session.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioMetrics {
    /// Wall time spent simulating (milliseconds).
    pub simulation_time_ms: u64,
    /// Notifications received by the headless host.
    pub host_events: usize,
    /// Simulated session duration in seconds.
    pub simulated_secs: f64,
}

/// Builder for scripted sessions.
///
/// # Example
///
/// ```rust,ignore
/// let result = ScenarioBuilder::new()
///     .straight(10_000.0)
///     .with_profile(RunnerProfile::default())
///     .with_seed(7)
///     .run()
///     .await?;
/// assert_eq!(result.lap_count, 1);
/// ```
pub struct ScenarioBuilder {
    shape: TrackShape,
    profile: Box<dyn AthleteProfile>,
    simulation: SimulationConfig,
    session: SessionConfig,
    ghost_speed: Option<f32>,
    end_after_secs: Option<f64>,
    failing_leaderboard: bool,
    track_metrics: bool,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    /// Creates a builder for a 100 m runner sprint.
    pub fn new() -> Self {
        Self {
            shape: TrackShape::Straight { length_cm: 10_000.0 },
            profile: Box::new(RunnerProfile::default()),
            simulation: SimulationConfig::default(),
            session: SessionConfig::default(),
            ghost_speed: None,
            end_after_secs: None,
            failing_leaderboard: false,
            track_metrics: false,
        }
    }

    pub fn with_shape(mut self, shape: TrackShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn straight(self, length_cm: f32) -> Self {
        self.with_shape(TrackShape::Straight { length_cm })
    }

    pub fn looped(self, radius_cm: f32) -> Self {
        self.with_shape(TrackShape::Loop { radius_cm })
    }

    pub fn random_walk(self, length_cm: f32) -> Self {
        self.with_shape(TrackShape::RandomWalk { length_cm })
    }

    pub fn with_gpx_file(self, path: impl Into<PathBuf>, is_loop: bool) -> Self {
        self.with_shape(TrackShape::GpxFile {
            path: path.into(),
            is_loop,
        })
    }

    pub fn with_waypoints(self, waypoints: Vec<Waypoint>, is_loop: bool) -> Self {
        self.with_shape(TrackShape::Waypoints { waypoints, is_loop })
    }

    pub fn with_profile(mut self, profile: impl AthleteProfile + 'static) -> Self {
        self.profile = Box::new(profile);
        self
    }

    pub fn with_simulation_config(mut self, config: SimulationConfig) -> Self {
        self.simulation = config;
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    /// Sets the random seed for path and trace generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.seed = seed;
        self
    }

    /// Sets the tracked position noise.
    pub fn with_jitter(mut self, cm: f32) -> Self {
        self.simulation.position_jitter_cm = cm;
        self
    }

    pub fn with_bounds(mut self, bounds: ArenaBounds) -> Self {
        self.simulation.bounds = bounds;
        self
    }

    /// Moves the ghost pacer's speed control after the session starts.
    pub fn with_ghost_speed(mut self, speed: f32) -> Self {
        self.ghost_speed = Some(speed);
        self
    }

    /// Presses "end session" once `secs` of the trace have elapsed.
    pub fn end_session_after(mut self, secs: f64) -> Self {
        self.end_after_secs = Some(secs);
        self
    }

    /// Uses a leaderboard backend that rejects every request.
    pub fn with_failing_leaderboard(mut self, failing: bool) -> Self {
        self.failing_leaderboard = failing;
        self
    }

    /// Enables metrics tracking for performance analysis.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.track_metrics = enabled;
        self
    }

    /// Resolves the track geometry.
    pub fn build_path(&self, rng: &mut StdRng) -> Result<(Vec<Waypoint>, bool), ScenarioError> {
        let bounds = self.simulation.bounds;
        let generator = PathGenerator::for_bounds(bounds);

        let (waypoints, is_loop) = match &self.shape {
            TrackShape::Straight { length_cm } => {
                (generator.straight(bounds.center(), 0.0, *length_cm), false)
            }
            TrackShape::Loop { radius_cm } => {
                (generator.circle_loop(bounds.center(), *radius_cm), true)
            }
            TrackShape::RandomWalk { length_cm } => {
                (generator.random_walk(bounds.center(), *length_cm, rng), false)
            }
            TrackShape::GpxFile { path, is_loop } => {
                (GpxLoader::load_file(path)?.waypoints, *is_loop)
            }
            TrackShape::Waypoints { waypoints, is_loop } => (waypoints.clone(), *is_loop),
        };

        if waypoints.len() < 2 {
            return Err(PathError::InvalidGeometry {
                waypoints: waypoints.len(),
            }
            .into());
        }
        Ok((waypoints, is_loop))
    }

    /// Runs the session frame by frame against a headless host and an
    /// in-memory leaderboard.
    ///
    /// Must be called inside a tokio runtime; leaderboard requests are flushed
    /// before returning.
    pub async fn run(&self) -> Result<ScenarioResult, ScenarioError> {
        let start_time = self.track_metrics.then(Instant::now);
        let mut rng = StdRng::seed_from_u64(self.simulation.seed);

        let (waypoints, is_loop) = self.build_path(&mut rng)?;
        let positions: Vec<Vec3> = waypoints.iter().map(|w| w.position).collect();
        let first = waypoints[0];
        let last = waypoints[waypoints.len() - 1];

        let trace = TraceGenerator::from_simulation(&self.simulation).generate(
            &positions,
            self.profile.as_ref(),
            &mut rng,
        );
        let Some(first_frame) = trace.first() else {
            return Err(ScenarioError::EmptyTrace);
        };

        let host = HeadlessHost::new();
        let board = Arc::new(if self.failing_leaderboard {
            MemoryLeaderboard::failing()
        } else {
            MemoryLeaderboard::new()
        });
        let client = LeaderboardClient::new(board.clone(), self.session.leaderboard.clone());
        let mut walker = PathWalker::new(self.session.clone(), host.collaborators(), client);

        let mut zones = vec![BoundaryPlane::from_waypoint(
            BoundaryEdge::Start,
            &first,
            &self.simulation,
        )];
        let start_marker = host.marker(BoundaryEdge::Start, first.position, first.rotation);
        let finish_marker: Option<Box<dyn BoundaryMarker>> = if is_loop {
            None
        } else {
            zones.push(BoundaryPlane::from_waypoint(
                BoundaryEdge::Finish,
                &last,
                &self.simulation,
            ));
            Some(Box::new(host.marker(
                BoundaryEdge::Finish,
                last.position,
                last.rotation,
            )))
        };

        host.pose.set(first_frame.position);
        walker.start(waypoints, is_loop, Box::new(start_marker), finish_marker, None);
        if let Some(speed) = self.ghost_speed {
            walker.set_animation_speed(speed);
        }

        let boundary_events = detect_exits(&trace, &zones);
        let mut pending = boundary_events.iter().peekable();
        let mut ended_by_walker = false;

        for (index, frame) in trace.iter().enumerate().skip(1) {
            host.clock.advance(frame.dt as f64);
            host.pose.set(frame.position);

            while let Some(event) = pending.next_if(|e| e.frame == index) {
                debug!(frame = index, edge = %event.edge, dot = event.dot, "Trigger zone exit");
                match event.edge {
                    BoundaryEdge::Start => walker.on_start_collision_exit(event.dot),
                    BoundaryEdge::Finish => walker.on_finish_collision_exit(event.dot),
                }
            }

            walker.on_frame(frame.dt);

            if let Some(limit) = self.end_after_secs
                && !ended_by_walker
                && frame.time >= limit
            {
                ended_by_walker = true;
                walker.on_end_session_requested();
            }
        }

        walker.flush_leaderboard().await;

        let submissions = board.submissions();
        let lap_time_ms = submissions
            .iter()
            .find(|s| s.board.category == LeaderboardCategory::LapTime)
            .map(|s| s.score);
        let simulated_secs = trace.last().map_or(0.0, |f| f.time);

        let metrics = start_time.map(|start| ScenarioMetrics {
            simulation_time_ms: start.elapsed().as_millis() as u64,
            host_events: host.journal.events().len(),
            simulated_secs,
        });

        let result = ScenarioResult {
            session_id: walker.leaderboard().session_id(),
            state: walker.state(),
            lap_count: walker.lap_count(),
            is_loop,
            frames: trace.len(),
            path_length_cm: walker.geometry().total_length(),
            distance_cm: walker.stats().total_distance(),
            average_pace: walker.stats().average_pace(),
            lap_time_ms,
            record_time: host.record_time.text(),
            warning_shown: host.journal.contains(&HostEvent::Warning(true)),
            ghost_arrived: walker.animator().normalized_position() >= 1.0,
            boundary_events,
            submissions,
            metrics,
        };

        info!(
            session_id = %result.session_id,
            state = %result.state,
            laps = result.lap_count,
            frames = result.frames,
            "Scenario complete"
        );

        Ok(result)
    }
}

/// Preset scenarios for common testing needs.
impl ScenarioBuilder {
    /// A 100 m sprint at running pace.
    pub fn sprint_test() -> Self {
        Self::new()
            .straight(10_000.0)
            .with_profile(RunnerProfile::default())
    }

    /// One walked lap of a 15 m radius circle.
    pub fn loop_test() -> Self {
        Self::new()
            .looped(1_500.0)
            .with_profile(WalkerProfile::default())
    }

    /// A sprint fast enough to trip the over-speed warning.
    pub fn overspeed_test() -> Self {
        Self::new()
            .straight(10_000.0)
            .with_profile(RunnerProfile::sprinter())
    }

    /// A wandering walk abandoned through "end session" before the finish.
    pub fn abandoned_walk_test() -> Self {
        Self::new()
            .random_walk(5_000.0)
            .with_profile(WalkerProfile::default())
            .end_session_after(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sprint_scenario() {
        let result = ScenarioBuilder::sprint_test()
            .with_metrics(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.state, SessionState::Finished);
        assert_eq!(result.lap_count, 1);
        assert!(!result.is_loop);
        assert!((result.path_length_cm - 10_000.0).abs() < 1.0);
        assert!(
            (9_500.0..11_000.0).contains(&result.distance_cm),
            "walked {}cm",
            result.distance_cm
        );

        let laps = result.submissions_for(LeaderboardCategory::LapTime);
        assert_eq!(laps.len(), 1);
        assert!((20_000..45_000).contains(&laps[0].score));
        let distances = result.submissions_for(LeaderboardCategory::Distance);
        assert_eq!(distances.len(), 1);
        assert_eq!(distances[0].score, result.distance_cm.floor() as i64);

        assert!(result.ghost_arrived);
        assert!(!result.warning_shown);
        assert!(result.metrics.unwrap().host_events > 0);
    }

    #[tokio::test]
    async fn test_loop_scenario_finishes_after_one_lap() {
        let result = ScenarioBuilder::loop_test()
            .with_jitter(0.0)
            .run()
            .await
            .unwrap();

        assert!(result.is_loop);
        assert_eq!(result.state, SessionState::Finished);
        assert_eq!(result.lap_count, 1);
        assert_eq!(result.submissions_for(LeaderboardCategory::LapTime).len(), 1);
        assert!(
            result
                .boundary_events
                .iter()
                .all(|e| e.edge == BoundaryEdge::Start)
        );
        assert!(!result.ghost_arrived);
    }

    #[tokio::test]
    async fn test_overspeed_shows_warning() {
        let result = ScenarioBuilder::overspeed_test().run().await.unwrap();
        assert!(result.warning_shown);
        assert_eq!(result.state, SessionState::Finished);
    }

    #[tokio::test]
    async fn test_abandoned_walk() {
        let result = ScenarioBuilder::abandoned_walk_test()
            .with_jitter(0.0)
            .run()
            .await
            .unwrap();

        assert_eq!(result.state, SessionState::Finished);
        assert_eq!(result.lap_count, 0);
        assert!(result.lap_time_ms.is_none());
        assert_eq!(result.submissions_for(LeaderboardCategory::Distance).len(), 1);
    }

    #[tokio::test]
    async fn test_failing_leaderboard_shows_placeholder() {
        let result = ScenarioBuilder::sprint_test()
            .with_failing_leaderboard(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.state, SessionState::Finished);
        assert!(result.submissions.is_empty());
        assert_eq!(result.record_time, "N/A");
    }

    #[tokio::test]
    async fn test_same_seed_same_outcome() {
        let a = ScenarioBuilder::sprint_test().with_seed(99).run().await.unwrap();
        let b = ScenarioBuilder::sprint_test().with_seed(99).run().await.unwrap();

        assert_eq!(a.frames, b.frames);
        assert_eq!(a.distance_cm, b.distance_cm);
        assert_eq!(a.lap_time_ms, b.lap_time_ms);
        assert_ne!(a.session_id, b.session_id);
    }

    #[tokio::test]
    async fn test_degenerate_path_is_rejected() {
        let result = ScenarioBuilder::new()
            .with_waypoints(vec![Waypoint::at(Vec3::ZERO)], false)
            .run()
            .await;

        assert!(matches!(
            result,
            Err(ScenarioError::Path(PathError::InvalidGeometry { waypoints: 1 }))
        ));
    }
}
