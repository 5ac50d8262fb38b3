//! Interfaces of everything the session talks to but does not own: timers,
//! pose and pace tracking, scene markers, visuals, sound and UI.
//!
//! The session only sends notifications to displays and presenters; it never
//! reads state back from them.

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::models::{PaceSample, Sound, Waypoint};

/// Lap stopwatch shown on the HUD.
pub trait Timer {
    fn start(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn increment_lap(&mut self);
    fn current_time_ms(&self) -> u64;
}

/// Derives pace readings from successive walker positions.
pub trait PaceSource {
    fn start(&mut self, position: Vec3);
    fn get_pace(&mut self, position: Vec3) -> PaceSample;
}

/// Device pose lookup.
pub trait PoseSource {
    /// Walker position projected onto the ground.
    fn player_ground_position(&self) -> Vec3;
}

/// Wall clock in seconds.
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// Start or finish line placed in the scene.
pub trait BoundaryMarker {
    fn on_start_sprint(&mut self);
    fn on_increment_loop(&mut self, next_lap: i32);
    fn on_reverse_sprint_track_visuals(&mut self);
    fn on_sprint_start_area_collision(&mut self);
    fn set_enable_walk_countdown(&mut self);

    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    /// Local up axis in world space.
    fn up(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);

    /// Removes the marker from the scene.
    fn destroy(&mut self);
}

pub trait ArrowVisualizer {
    fn start(&mut self, ordered_points: &[Vec3], spline_points: &[Waypoint], total_length: f32);
    fn stop(&mut self);
}

/// Path mesh shown on the ground.
pub trait MeshBuilder {
    fn build_from_points(&mut self, points: &[Vec3], resolution: u32);
    fn set_enabled(&mut self, enabled: bool);
}

pub trait ProgressDisplay {
    fn set_progress(&mut self, progress: f32);
}

pub trait WarningDisplay {
    fn toggle_warning(&mut self, shown: bool);
}

pub trait UiPresenter {
    fn show_go_to_start(&mut self, path_length: f32);
    fn show_end_session(&mut self);
    fn show_leaderboard_with_new_game(&mut self);
    fn hide_ui(&mut self);
}

/// Heads-up display worn while walking.
pub trait Hud {
    fn set_enabled(&mut self, enabled: bool);
    fn set_average_pace_text(&mut self, text: &str);
    fn set_lap_count_text(&mut self, text: &str);
    fn set_speed_panel_enabled(&mut self, enabled: bool);
}

/// Record time label; written from leaderboard completions as well.
pub trait RecordTimeDisplay: Send + Sync {
    fn set_record_time(&self, text: &str);
}

pub trait SoundPlayer {
    fn play(&mut self, sound: Sound);
    fn stop_all(&mut self);
}

/// The ghost pacer object moved by the animator.
pub trait Follower {
    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);
}

/// Everything a session needs from its host.
pub struct Collaborators {
    pub timer: Box<dyn Timer>,
    pub pace: Box<dyn PaceSource>,
    pub pose: Box<dyn PoseSource>,
    pub clock: Box<dyn Clock>,
    pub arrows: Box<dyn ArrowVisualizer>,
    pub mesh: Box<dyn MeshBuilder>,
    pub progress: Box<dyn ProgressDisplay>,
    pub warning: Box<dyn WarningDisplay>,
    pub ui: Box<dyn UiPresenter>,
    pub hud: Box<dyn Hud>,
    pub sound: Box<dyn SoundPlayer>,
    pub record_time: Arc<dyn RecordTimeDisplay>,
    /// Optional: without it the ghost pacer does not run.
    pub follower: Option<Box<dyn Follower>>,
}
