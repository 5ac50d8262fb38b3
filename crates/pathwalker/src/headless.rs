//! In-process host for running sessions without a scene.
//!
//! Every collaborator records what it was told into a shared [`Journal`], and
//! the inputs a device would provide (clock, walker position) are set by hand.
//! Used by the simulator and by tests.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use glam::{Quat, Vec3};

use crate::{
    collaborators::{
        ArrowVisualizer, BoundaryMarker, Clock, Collaborators, Follower, Hud, MeshBuilder,
        PaceSource, PoseSource, ProgressDisplay, RecordTimeDisplay, SoundPlayer, Timer,
        UiPresenter, WarningDisplay,
    },
    errors::LeaderboardError,
    leaderboard::LeaderboardSink,
    models::{
        BoardOptions, BoundaryEdge, LeaderboardCategory, OrderingPolicy, PaceSample, Pose,
        ScoreRecord, ScoreSubmission, Sound,
    },
};

/// A notification received by the headless host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    TimerStarted,
    TimerPaused,
    TimerStopped,
    TimerLap,
    PaceStarted(Vec3),
    CountdownEnabled(BoundaryEdge),
    SprintStarted(BoundaryEdge),
    LoopIncremented { edge: BoundaryEdge, next_lap: i32 },
    VisualsReversed(BoundaryEdge),
    StartAreaCollision(BoundaryEdge),
    MarkerDestroyed(BoundaryEdge),
    ArrowsStarted { points: Vec<Vec3>, total_length: f32 },
    ArrowsStopped,
    MeshBuilt { points: Vec<Vec3>, resolution: u32 },
    MeshEnabled(bool),
    Progress(f32),
    Warning(bool),
    ShowGoToStart(f32),
    ShowEndSession,
    ShowLeaderboard,
    HideUi,
    HudEnabled(bool),
    AveragePace(String),
    LapCount(String),
    SpeedPanel(bool),
    SoundPlayed(Sound),
    SoundsStopped,
}

/// Shared, append-only event log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<HostEvent>>>);

impl Journal {
    pub fn record(&self, event: HostEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.0.borrow().clone()
    }

    pub fn count(&self, predicate: impl Fn(&HostEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| predicate(e)).count()
    }

    pub fn contains(&self, event: &HostEvent) -> bool {
        self.0.borrow().iter().any(|e| e == event)
    }

    pub fn last_progress(&self) -> Option<f32> {
        self.0.borrow().iter().rev().find_map(|e| match e {
            HostEvent::Progress(p) => Some(*p),
            _ => None,
        })
    }

    pub fn last_mesh(&self) -> Option<Vec<Vec3>> {
        self.0.borrow().iter().rev().find_map(|e| match e {
            HostEvent::MeshBuilt { points, .. } => Some(points.clone()),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Clock advanced explicitly by the caller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn advance(&self, secs: f64) {
        self.0.set(self.0.get() + secs);
    }

    pub fn set(&self, secs: f64) {
        self.0.set(secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.0.get()
    }
}

/// Walker position set by the caller.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPose(Rc<Cell<Vec3>>);

impl ScriptedPose {
    pub fn set(&self, position: Vec3) {
        self.0.set(position);
    }

    pub fn get(&self) -> Vec3 {
        self.0.get()
    }
}

impl PoseSource for ScriptedPose {
    fn player_ground_position(&self) -> Vec3 {
        self.0.get()
    }
}

/// Stopwatch running on a [`ManualClock`].
#[derive(Debug)]
pub struct ClockTimer {
    clock: ManualClock,
    journal: Journal,
    accumulated: f64,
    running_since: Option<f64>,
}

impl ClockTimer {
    pub fn new(clock: ManualClock, journal: Journal) -> Self {
        Self {
            clock,
            journal,
            accumulated: 0.0,
            running_since: None,
        }
    }

    fn elapsed(&self) -> f64 {
        let running = self
            .running_since
            .map_or(0.0, |since| self.clock.now_secs() - since);
        self.accumulated + running
    }
}

impl Timer for ClockTimer {
    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(self.clock.now_secs());
        }
        self.journal.record(HostEvent::TimerStarted);
    }

    fn pause(&mut self) {
        self.accumulated = self.elapsed();
        self.running_since = None;
        self.journal.record(HostEvent::TimerPaused);
    }

    fn stop(&mut self) {
        self.accumulated = 0.0;
        self.running_since = None;
        self.journal.record(HostEvent::TimerStopped);
    }

    fn increment_lap(&mut self) {
        self.journal.record(HostEvent::TimerLap);
    }

    fn current_time_ms(&self) -> u64 {
        (self.elapsed().max(0.0) * 1000.0).round() as u64
    }
}

/// Pace from ground distance between successive positions.
#[derive(Debug)]
pub struct TrackingPace {
    clock: ManualClock,
    journal: Journal,
    last: Option<(Vec3, f64)>,
}

impl TrackingPace {
    pub fn new(clock: ManualClock, journal: Journal) -> Self {
        Self {
            clock,
            journal,
            last: None,
        }
    }
}

impl PaceSource for TrackingPace {
    fn start(&mut self, position: Vec3) {
        self.last = Some((position, self.clock.now_secs()));
        self.journal.record(HostEvent::PaceStarted(position));
    }

    fn get_pace(&mut self, position: Vec3) -> PaceSample {
        let now = self.clock.now_secs();
        let Some((previous, then)) = self.last.replace((position, now)) else {
            return PaceSample {
                normalized_position: position,
                ..Default::default()
            };
        };

        let ground = |v: Vec3| Vec3::new(v.x, 0.0, v.z);
        let distance_delta = ground(position).distance(ground(previous));
        let time_delta = (now - then) as f32;
        let pace = if time_delta > 0.0 {
            distance_delta / time_delta
        } else {
            0.0
        };

        PaceSample {
            normalized_position: position,
            pace,
            distance_delta,
            time_delta,
        }
    }
}

/// Scene marker that records notifications and keeps its pose in a shared cell.
#[derive(Debug)]
pub struct RecordingMarker {
    edge: BoundaryEdge,
    journal: Journal,
    pose: Rc<Cell<Pose>>,
}

impl RecordingMarker {
    pub fn new(edge: BoundaryEdge, position: Vec3, rotation: Quat, journal: Journal) -> Self {
        Self {
            edge,
            journal,
            pose: Rc::new(Cell::new(Pose { position, rotation })),
        }
    }

    /// Handle that keeps observing the marker after it is boxed.
    pub fn pose_handle(&self) -> Rc<Cell<Pose>> {
        self.pose.clone()
    }
}

impl BoundaryMarker for RecordingMarker {
    fn on_start_sprint(&mut self) {
        self.journal.record(HostEvent::SprintStarted(self.edge));
    }

    fn on_increment_loop(&mut self, next_lap: i32) {
        self.journal.record(HostEvent::LoopIncremented {
            edge: self.edge,
            next_lap,
        });
    }

    fn on_reverse_sprint_track_visuals(&mut self) {
        self.journal.record(HostEvent::VisualsReversed(self.edge));
    }

    fn on_sprint_start_area_collision(&mut self) {
        self.journal.record(HostEvent::StartAreaCollision(self.edge));
    }

    fn set_enable_walk_countdown(&mut self) {
        self.journal.record(HostEvent::CountdownEnabled(self.edge));
    }

    fn position(&self) -> Vec3 {
        self.pose.get().position
    }

    fn rotation(&self) -> Quat {
        self.pose.get().rotation
    }

    fn up(&self) -> Vec3 {
        self.pose.get().rotation * Vec3::Y
    }

    fn set_position(&mut self, position: Vec3) {
        let mut pose = self.pose.get();
        pose.position = position;
        self.pose.set(pose);
    }

    fn set_rotation(&mut self, rotation: Quat) {
        let mut pose = self.pose.get();
        pose.rotation = rotation;
        self.pose.set(pose);
    }

    fn destroy(&mut self) {
        self.journal.record(HostEvent::MarkerDestroyed(self.edge));
    }
}

/// Follower whose latest pose is kept in a shared cell.
#[derive(Debug, Clone, Default)]
pub struct RecordingFollower(Rc<Cell<Option<Pose>>>);

impl RecordingFollower {
    pub fn pose(&self) -> Option<Pose> {
        self.0.get()
    }
}

impl Follower for RecordingFollower {
    fn set_position(&mut self, position: Vec3) {
        let rotation = self.0.get().map_or(Quat::IDENTITY, |p| p.rotation);
        self.0.set(Some(Pose { position, rotation }));
    }

    fn set_rotation(&mut self, rotation: Quat) {
        let position = self.0.get().map_or(Vec3::ZERO, |p| p.position);
        self.0.set(Some(Pose { position, rotation }));
    }
}

/// Record time label shared with leaderboard tasks.
#[derive(Debug, Clone, Default)]
pub struct SharedLabel(Arc<Mutex<String>>);

impl SharedLabel {
    pub fn text(&self) -> String {
        self.0.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl RecordTimeDisplay for SharedLabel {
    fn set_record_time(&self, text: &str) {
        if let Ok(mut label) = self.0.lock() {
            *label = text.to_string();
        }
    }
}

/// Journal-backed implementation of every display-side collaborator.
#[derive(Debug, Clone)]
struct Recorder(Journal);

impl ArrowVisualizer for Recorder {
    fn start(&mut self, ordered_points: &[Vec3], _spline_points: &[crate::models::Waypoint], total_length: f32) {
        self.0.record(HostEvent::ArrowsStarted {
            points: ordered_points.to_vec(),
            total_length,
        });
    }

    fn stop(&mut self) {
        self.0.record(HostEvent::ArrowsStopped);
    }
}

impl MeshBuilder for Recorder {
    fn build_from_points(&mut self, points: &[Vec3], resolution: u32) {
        self.0.record(HostEvent::MeshBuilt {
            points: points.to_vec(),
            resolution,
        });
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.0.record(HostEvent::MeshEnabled(enabled));
    }
}

impl ProgressDisplay for Recorder {
    fn set_progress(&mut self, progress: f32) {
        self.0.record(HostEvent::Progress(progress));
    }
}

impl WarningDisplay for Recorder {
    fn toggle_warning(&mut self, shown: bool) {
        self.0.record(HostEvent::Warning(shown));
    }
}

impl UiPresenter for Recorder {
    fn show_go_to_start(&mut self, path_length: f32) {
        self.0.record(HostEvent::ShowGoToStart(path_length));
    }

    fn show_end_session(&mut self) {
        self.0.record(HostEvent::ShowEndSession);
    }

    fn show_leaderboard_with_new_game(&mut self) {
        self.0.record(HostEvent::ShowLeaderboard);
    }

    fn hide_ui(&mut self) {
        self.0.record(HostEvent::HideUi);
    }
}

impl Hud for Recorder {
    fn set_enabled(&mut self, enabled: bool) {
        self.0.record(HostEvent::HudEnabled(enabled));
    }

    fn set_average_pace_text(&mut self, text: &str) {
        self.0.record(HostEvent::AveragePace(text.to_string()));
    }

    fn set_lap_count_text(&mut self, text: &str) {
        self.0.record(HostEvent::LapCount(text.to_string()));
    }

    fn set_speed_panel_enabled(&mut self, enabled: bool) {
        self.0.record(HostEvent::SpeedPanel(enabled));
    }
}

impl SoundPlayer for Recorder {
    fn play(&mut self, sound: Sound) {
        self.0.record(HostEvent::SoundPlayed(sound));
    }

    fn stop_all(&mut self) {
        self.0.record(HostEvent::SoundsStopped);
    }
}

/// In-memory leaderboard backend.
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    submissions: Mutex<Vec<ScoreSubmission>>,
    failing: bool,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects every request.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn submissions(&self) -> Vec<ScoreSubmission> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn submissions_for(&self, category: LeaderboardCategory) -> Vec<ScoreSubmission> {
        self.submissions()
            .into_iter()
            .filter(|s| s.board.category == category)
            .collect()
    }
}

#[async_trait]
impl LeaderboardSink for MemoryLeaderboard {
    async fn submit_score(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<Option<ScoreRecord>, LeaderboardError> {
        if self.failing {
            return Err(LeaderboardError::Unavailable("offline".to_string()));
        }
        let mut submissions = self
            .submissions
            .lock()
            .map_err(|e| LeaderboardError::Unavailable(e.to_string()))?;
        submissions.push(submission.clone());
        Ok(Some(ScoreRecord {
            display_name: None,
            score: submission.score,
        }))
    }

    async fn personal_best(
        &self,
        board: &BoardOptions,
    ) -> Result<Option<ScoreRecord>, LeaderboardError> {
        if self.failing {
            return Err(LeaderboardError::Rejected { status: 503 });
        }
        let submissions = self
            .submissions
            .lock()
            .map_err(|e| LeaderboardError::Unavailable(e.to_string()))?;
        let scores = submissions
            .iter()
            .filter(|s| s.board.name == board.name)
            .map(|s| s.score);
        let best = match board.ordering {
            OrderingPolicy::LowerIsBetter => scores.min(),
            OrderingPolicy::HigherIsBetter => scores.max(),
        };
        Ok(best.map(|score| ScoreRecord {
            display_name: None,
            score,
        }))
    }
}

/// Handles to every input and output of a headless session.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    pub journal: Journal,
    pub clock: ManualClock,
    pub pose: ScriptedPose,
    pub record_time: SharedLabel,
    pub follower: RecordingFollower,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collaborators wired to this host, with a follower.
    pub fn collaborators(&self) -> Collaborators {
        let recorder = Recorder(self.journal.clone());
        Collaborators {
            timer: Box::new(ClockTimer::new(self.clock.clone(), self.journal.clone())),
            pace: Box::new(TrackingPace::new(self.clock.clone(), self.journal.clone())),
            pose: Box::new(self.pose.clone()),
            clock: Box::new(self.clock.clone()),
            arrows: Box::new(recorder.clone()),
            mesh: Box::new(recorder.clone()),
            progress: Box::new(recorder.clone()),
            warning: Box::new(recorder.clone()),
            ui: Box::new(recorder.clone()),
            hud: Box::new(recorder.clone()),
            sound: Box::new(recorder),
            record_time: Arc::new(self.record_time.clone()),
            follower: Some(Box::new(self.follower.clone())),
        }
    }

    pub fn marker(&self, edge: BoundaryEdge, position: Vec3, rotation: Quat) -> RecordingMarker {
        RecordingMarker::new(edge, position, rotation, self.journal.clone())
    }
}
