//! Lap and sprint state machine of a walking session.
//!
//! A [`PathWalker`] owns the path geometry and session state. The host drives
//! it through two independent frame ticks ([`PathWalker::tick`] for the walker,
//! [`PathWalker::tick_animation`] for the ghost pacer), boundary events from
//! its trigger zones and the UI commands.
//!
//! ```text
//! Inactive --start()--> Prep --start exit, dot > 0--> Walking --lap 1--> Finished
//!     ^                                                                     |
//!     +----------------------------- reset_state() -------------------------+
//! ```

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use tracing::{debug, info, warn};

use crate::{
    animator::{AnimatorEvent, PathAnimator},
    collaborators::{BoundaryMarker, Collaborators},
    config::SessionConfig,
    geometry::PathGeometry,
    leaderboard::{LeaderboardClient, format_lap_time},
    models::{BoundaryEdge, PaceSample, Pose, PresentationStage, SessionState, Sound, Waypoint},
    progress::ProgressReporter,
    stats::{PaceMetric, PaceMonitor, SessionStats},
};

/// Called when the walker asks for a new game after a session.
pub type FinishedCallback = Box<dyn FnMut()>;

pub struct PathWalker {
    config: SessionConfig,
    host: Collaborators,
    leaderboard: LeaderboardClient,

    // Session state
    state: SessionState,
    is_outside_sprint_zone: bool,
    lap_count: i32,
    stats: SessionStats,
    pace_monitor: PaceMonitor,
    progress: ProgressReporter,
    on_finished: Option<FinishedCallback>,

    // Path
    geometry: PathGeometry,
    start_marker: Option<Box<dyn BoundaryMarker>>,
    finish_marker: Option<Box<dyn BoundaryMarker>>,

    // UI
    stage: PresentationStage,
    is_ui_shown: bool,

    animator: PathAnimator,
}

impl PathWalker {
    pub fn new(config: SessionConfig, host: Collaborators, leaderboard: LeaderboardClient) -> Self {
        let pace_monitor = PaceMonitor::new(
            config.speed_warning_threshold,
            config.ui_hide_pace_threshold,
            config.pace_display_factor,
        );
        let animator = PathAnimator::new(config.animator.clone());

        let mut walker = Self {
            config,
            host,
            leaderboard,
            state: SessionState::Inactive,
            is_outside_sprint_zone: false,
            lap_count: -1,
            stats: SessionStats::new(),
            pace_monitor,
            progress: ProgressReporter::new(),
            on_finished: None,
            geometry: PathGeometry::empty(),
            start_marker: None,
            finish_marker: None,
            stage: PresentationStage::None,
            is_ui_shown: false,
            animator,
        };
        walker.reset_state();
        walker
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn lap_count(&self) -> i32 {
        self.lap_count
    }

    pub fn is_loop(&self) -> bool {
        self.geometry.is_loop()
    }

    pub fn is_forward(&self) -> bool {
        self.geometry.is_forward()
    }

    pub fn is_outside_sprint_zone(&self) -> bool {
        self.is_outside_sprint_zone
    }

    pub fn is_ui_shown(&self) -> bool {
        self.is_ui_shown
    }

    pub fn stage(&self) -> PresentationStage {
        self.stage
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    pub fn animator(&self) -> &PathAnimator {
        &self.animator
    }

    pub fn last_progress(&self) -> Option<f32> {
        self.progress.last()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn leaderboard(&self) -> &LeaderboardClient {
        &self.leaderboard
    }

    pub fn leaderboard_mut(&mut self) -> &mut LeaderboardClient {
        &mut self.leaderboard
    }

    /// Waits for outstanding leaderboard requests.
    pub async fn flush_leaderboard(&mut self) {
        self.leaderboard.flush().await;
    }

    /// Begins a session on `waypoints`. Any running session is reset first.
    pub fn start(
        &mut self,
        waypoints: Vec<Waypoint>,
        is_loop: bool,
        mut start_marker: Box<dyn BoundaryMarker>,
        finish_marker: Option<Box<dyn BoundaryMarker>>,
        on_finished: Option<FinishedCallback>,
    ) {
        self.reset_state();
        self.state = SessionState::Prep;
        let session_id = self.leaderboard.begin_session();

        if waypoints.len() < 2 {
            warn!(
                %session_id,
                waypoints = waypoints.len(),
                "Path has fewer than 2 waypoints, progress will not be reported"
            );
        }
        self.geometry = PathGeometry::build_from(waypoints, is_loop);
        self.rebuild_mesh();
        self.host.mesh.set_enabled(true);

        start_marker.set_enable_walk_countdown();
        self.start_marker = Some(start_marker);
        if let Some(mut finish_marker) = finish_marker {
            finish_marker.set_enable_walk_countdown();
            self.finish_marker = Some(finish_marker);
        }

        self.stage = PresentationStage::GoToStart;
        self.ensure_ui_shown();
        self.on_finished = on_finished;

        // Arrows point from start to finish in the authored order.
        self.host.arrows.start(
            self.geometry.animation_path(),
            self.geometry.waypoints(),
            self.geometry.total_length(),
        );

        self.start_animation();

        info!(
            %session_id,
            is_loop,
            waypoints = self.geometry.len(),
            length = self.geometry.total_length(),
            "Session started"
        );
    }

    /// Per-frame update of the walker side of the session.
    pub fn tick(&mut self, dt: f32) {
        if self.is_degenerate_frame(dt) {
            return;
        }

        match self.state {
            SessionState::Inactive | SessionState::Prep | SessionState::Finished => {}
            SessionState::Walking => self.tick_walking(),
        }
    }

    /// Per-frame update of the ghost pacer.
    pub fn tick_animation(&mut self, dt: f32) {
        if self.is_degenerate_frame(dt) {
            return;
        }

        let now = self.host.clock.now_secs();
        let event = self.animator.tick(
            now,
            dt,
            self.geometry.animation_path(),
            self.geometry.is_loop(),
        );
        match event {
            AnimatorEvent::Idle => {}
            AnimatorEvent::Moved(pose) => self.place_follower(pose),
            AnimatorEvent::Arrived(pose) => {
                self.place_follower(pose);
                self.stop_animation();
            }
        }
    }

    /// Both ticks, for hosts with a single frame callback.
    pub fn on_frame(&mut self, dt: f32) {
        self.tick(dt);
        self.tick_animation(dt);
    }

    fn is_degenerate_frame(&self, dt: f32) -> bool {
        // Capture loops produce synthetic frames with tiny deltas.
        !(dt >= self.config.min_frame_delta)
    }

    fn tick_walking(&mut self) {
        let position = self.host.pose.player_ground_position();
        let sample = self.host.pace.get_pace(position);

        let signals = self.pace_monitor.observe(sample.pace);
        if let Some(shown) = signals.warning_toggled {
            self.host.warning.toggle_warning(shown);
        }
        if signals.hide_ui {
            self.ensure_ui_hidden();
        } else {
            self.ensure_ui_shown();
        }

        if !self.is_outside_sprint_zone {
            if let Some(t) = self.geometry.project(position) {
                self.update_progress(t);
            }
            self.set_player_stats(&sample);
        }
    }

    fn update_progress(&mut self, t: f32) {
        let progress = self.progress.report(t, self.geometry.is_forward());
        self.host.progress.set_progress(progress);
    }

    fn set_player_stats(&mut self, sample: &PaceSample) {
        self.stats.next_sample(sample);
        if let Some(average) = self.stats.average_pace() {
            let display = average * self.config.pace_display_factor;
            self.host.hud.set_average_pace_text(&format!("{display:.1}"));
        }
    }

    /// The walker left the start trigger; `dot` is positive when moving along
    /// the marker's facing direction.
    pub fn on_start_collision_exit(&mut self, dot: f32) {
        if !self.state.accepts_start_boundary() {
            return;
        }

        if dot > 0.0 {
            match self.state {
                SessionState::Prep => self.begin_walking(),
                SessionState::Walking => {
                    if self.geometry.is_loop() {
                        self.increment_lap();
                    } else {
                        // Re-entering the sprint
                        self.host.sound.play(Sound::StartLap);
                        self.is_outside_sprint_zone = false;
                    }
                    if self.state == SessionState::Walking {
                        self.host.timer.start();
                    }
                }
                SessionState::Inactive | SessionState::Finished => {}
            }
        } else if self.state == SessionState::Walking && !self.geometry.is_loop() {
            // Finishing a reverse sprint. Leaving a loop backwards is ignored.
            self.host.timer.pause();
            self.is_outside_sprint_zone = true;
            self.increment_lap();
            self.reverse_sprint_track_visuals(BoundaryEdge::Start);
        }
    }

    /// The walker left the finish trigger.
    pub fn on_finish_collision_exit(&mut self, dot: f32) {
        if self.state != SessionState::Walking {
            return;
        }

        if dot > 0.0 {
            self.host.timer.pause();
            self.is_outside_sprint_zone = true;
            self.increment_lap();
            self.reverse_sprint_track_visuals(BoundaryEdge::Finish);
        } else {
            // Re-entering the reverse sprint
            self.host.sound.play(Sound::StartLap);
            self.is_outside_sprint_zone = false;
            self.host.timer.start();
        }
    }

    fn begin_walking(&mut self) {
        let position = self.host.pose.player_ground_position();
        self.host.pace.start(position);
        self.host.hud.set_enabled(true);
        self.update_progress(0.0);
        self.lap_count = 0;
        self.stage = PresentationStage::Walking;
        self.update_ui();
        self.host.timer.start();
        self.state = SessionState::Walking;

        self.host.hud.set_speed_panel_enabled(false);
        self.host.sound.play(Sound::StartWalkPath);
        self.refresh_arrows();

        if self.geometry.is_loop() {
            // Show the lap that completes on the next pass
            let next_lap = self.lap_count + 1;
            match self.start_marker.as_mut() {
                Some(marker) => marker.on_increment_loop(next_lap),
                None => warn!("Start marker missing, cannot show next lap"),
            }
        } else {
            if self.finish_marker.is_none() {
                warn!("Sprint started without a finish marker");
            }
            for marker in self.markers_mut() {
                marker.on_start_sprint();
            }
        }

        info!(
            session_id = %self.leaderboard.session_id(),
            "Walker crossed the start line"
        );
    }

    /// Records a completed lap. At the first completed lap the session ends.
    fn increment_lap(&mut self) {
        self.host.sound.play(Sound::CompleteLap);
        self.host.timer.increment_lap();
        self.lap_count += 1;
        self.host.hud.set_lap_count_text(&self.lap_count.to_string());

        let time_ms = self.host.timer.current_time_ms();
        info!(
            lap = self.lap_count,
            "Lap completed in {}s",
            time_ms as f64 / 1000.0
        );
        self.leaderboard.submit_lap_time(time_ms);
        self.host.record_time.set_record_time(&format_lap_time(time_ms));

        if self.lap_count == 1 {
            info!("One lap completed, ending session");
            self.state = SessionState::Finished;
            self.stop();
            return;
        }

        if self.geometry.is_loop()
            && let Some(marker) = self.start_marker.as_mut()
        {
            marker.on_increment_loop(self.lap_count + 1);
        }
    }

    /// Ends the session: submits the distance walked and shows the leaderboard.
    /// State is kept until [`PathWalker::reset_state`].
    fn stop(&mut self) {
        self.host.sound.stop_all();

        let final_score = self.stats.total_distance().floor() as i64;
        if final_score > 0 {
            self.leaderboard.submit_distance(final_score);
        }

        self.host.ui.show_leaderboard_with_new_game();
        self.leaderboard
            .refresh_record_time(self.host.record_time.clone());
    }

    /// "End session" from the UI.
    pub fn on_end_session_requested(&mut self) {
        match self.state {
            SessionState::Prep | SessionState::Walking => {
                info!(lap = self.lap_count, "Session ended by the walker");
                self.state = SessionState::Finished;
                self.stop();
            }
            SessionState::Inactive | SessionState::Finished => {
                debug!(state = %self.state, "End session ignored");
            }
        }
    }

    /// "New game" from the UI.
    pub fn on_new_game_requested(&mut self) {
        self.reset_state();
        if let Some(on_finished) = self.on_finished.as_mut() {
            on_finished();
        }
    }

    /// The walker stepped into the sprint start area. Sprint tracks may be
    /// swapped end for end so the walker starts where they stand.
    pub fn on_sprint_start_area_collision(&mut self, reverse_track: bool) {
        if self.geometry.is_loop() || !self.state.accepts_start_boundary() {
            return;
        }

        for marker in self.markers_mut() {
            marker.on_sprint_start_area_collision();
        }
        if reverse_track {
            self.reverse_sprint_track();
        }
    }

    /// Swaps the start and finish ends of a sprint track.
    ///
    /// Markers exchange positions and orientations (each turned around its up
    /// axis), spline and display points reverse together. The animation path
    /// is left alone.
    pub fn reverse_sprint_track(&mut self) {
        let (Some(start), Some(finish)) = (self.start_marker.as_mut(), self.finish_marker.as_mut())
        else {
            warn!("Cannot reverse sprint track without both markers");
            return;
        };

        let start_position = start.position();
        let flipped_start = flipped_rotation(start.rotation(), start.up());
        let finish_position = finish.position();
        let flipped_finish = flipped_rotation(finish.rotation(), finish.up());

        start.set_position(finish_position);
        start.set_rotation(flipped_finish);
        finish.set_position(start_position);
        finish.set_rotation(flipped_start);

        self.geometry.reverse_spline();
        self.geometry.reverse_display();
        self.rebuild_mesh();
        self.refresh_arrows();

        debug!("Sprint track reversed");
    }

    /// Flips the visual direction after leaving through `edge`, when that edge
    /// disagrees with the current direction. Returns whether it flipped.
    pub fn reverse_sprint_track_visuals(&mut self, edge: BoundaryEdge) -> bool {
        let flipped = self.geometry.flip_direction_for(edge);

        if flipped && !self.geometry.display_points().is_empty() {
            self.geometry.reverse_display();
            self.rebuild_mesh();
            if self.start_marker.is_some() && self.finish_marker.is_some() {
                self.refresh_arrows();
                for marker in self.markers_mut() {
                    marker.on_reverse_sprint_track_visuals();
                }
            }
            debug!(%edge, forward = self.geometry.is_forward(), "Track visuals reversed");
        }

        flipped
    }

    /// Returns the session to `Inactive`. Safe to call in any state.
    pub fn reset_state(&mut self) {
        self.state = SessionState::Inactive;
        self.is_outside_sprint_zone = false;
        self.lap_count = -1;
        self.stats.reset();
        self.progress.reset();
        if self.pace_monitor.reset() {
            self.host.warning.toggle_warning(false);
        }

        // Path
        self.geometry = PathGeometry::empty();
        self.host.mesh.set_enabled(false);
        self.host.arrows.stop();
        for mut marker in [self.start_marker.take(), self.finish_marker.take()]
            .into_iter()
            .flatten()
        {
            marker.destroy();
        }

        self.stop_animation();
        self.animator.reset();

        // HUD
        self.host.timer.stop();
        self.host.hud.set_average_pace_text("0");
        self.host.hud.set_lap_count_text("0");
        self.host.hud.set_enabled(false);

        self.ensure_ui_hidden();
        self.stage = PresentationStage::None;
    }

    /// Speed control input for the ghost pacer.
    pub fn set_animation_speed(&mut self, speed: f32) {
        self.animator.set_speed(speed);
    }

    fn start_animation(&mut self) {
        let Some(follower) = self.host.follower.as_mut() else {
            warn!("Animated object not assigned");
            return;
        };

        if let Some(marker) = &self.start_marker {
            follower.set_position(marker.position());
        }

        self.animator.start(self.host.clock.now_secs());
        // Show the speed control
        self.host.hud.set_speed_panel_enabled(true);
    }

    fn stop_animation(&mut self) {
        self.animator.stop();
        self.host.hud.set_speed_panel_enabled(false);
    }

    fn place_follower(&mut self, pose: Pose) {
        if let Some(follower) = self.host.follower.as_mut() {
            follower.set_position(pose.position);
            follower.set_rotation(pose.rotation);
        }
    }

    fn rebuild_mesh(&mut self) {
        self.host
            .mesh
            .build_from_points(self.geometry.display_points(), self.config.mesh_resolution);
    }

    fn refresh_arrows(&mut self) {
        let points = self.geometry.arrow_points();
        self.host.arrows.start(
            &points,
            self.geometry.waypoints(),
            self.geometry.total_length(),
        );
    }

    fn markers_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn BoundaryMarker>> {
        self.start_marker
            .iter_mut()
            .chain(self.finish_marker.iter_mut())
    }

    fn ensure_ui_shown(&mut self) {
        if self.is_ui_shown {
            return;
        }
        self.is_ui_shown = true;
        self.show_ui();
    }

    fn ensure_ui_hidden(&mut self) {
        if !self.is_ui_shown {
            return;
        }
        self.is_ui_shown = false;
        self.host.ui.hide_ui();
    }

    fn update_ui(&mut self) {
        if !self.is_ui_shown {
            return;
        }
        self.show_ui();
    }

    fn show_ui(&mut self) {
        match self.stage {
            PresentationStage::None => {}
            PresentationStage::GoToStart => {
                self.host.ui.show_go_to_start(self.geometry.total_length());
            }
            PresentationStage::Walking => self.host.ui.show_end_session(),
        }
    }
}

/// `rotation` turned half a revolution around `up`.
pub fn flipped_rotation(rotation: Quat, up: Vec3) -> Quat {
    let axis = up.try_normalize().unwrap_or(Vec3::Y);
    Quat::from_axis_angle(axis, PI) * rotation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flipped_rotation() {
        let flipped = flipped_rotation(Quat::IDENTITY, Vec3::Y);
        assert!((flipped * Vec3::Z).distance(-Vec3::Z) < 1e-5);
        assert!((flipped * Vec3::Y).distance(Vec3::Y) < 1e-5);

        // Degenerate up axis falls back to world up.
        let fallback = flipped_rotation(Quat::IDENTITY, Vec3::ZERO);
        assert!((fallback * Vec3::X).distance(-Vec3::X) < 1e-5);
    }
}
