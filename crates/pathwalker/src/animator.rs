//! Ghost pacer that replays the authored path at an adjustable speed.
//!
//! The animator only knows about the canonical animation path; track reversals
//! never reach it. It starts moving once the configured delay has elapsed on
//! the wall clock and then advances `speed × dt` of the path per tick.

use glam::{Mat3, Quat, Vec3};
use tracing::{debug, info};

use crate::{config::AnimatorConfig, models::Pose};

/// Forward vectors shorter than this keep the previous orientation.
const MIN_FORWARD_LENGTH: f32 = 0.001;

/// Outcome of one animator tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorEvent {
    /// Nothing moved: not started, still waiting, already arrived or no path.
    Idle,
    /// The follower moved to a new pose.
    Moved(Pose),
    /// The follower reached the end of a non-looping path and stopped.
    Arrived(Pose),
}

#[derive(Debug, Clone)]
pub struct PathAnimator {
    config: AnimatorConfig,
    normalized_position: f32,
    speed: f32,
    is_running: bool,
    is_active: bool,
    start_time: Option<f64>,
    rotation: Quat,
}

impl PathAnimator {
    pub fn new(config: AnimatorConfig) -> Self {
        let speed = config.control_initial_value;
        Self {
            config,
            normalized_position: 0.0,
            speed,
            is_running: false,
            is_active: false,
            start_time: None,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn normalized_position(&self) -> f32 {
        self.normalized_position
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Started and not yet stopped (waiting for the delay or moving).
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn start_delay_elapsed(&self) -> bool {
        self.is_running
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Arms the animator at the beginning of the path; motion begins after the
    /// start delay.
    pub fn start(&mut self, now: f64) {
        self.speed = self.config.default_speed;
        self.normalized_position = 0.0;
        self.is_running = false;
        self.is_active = true;
        self.start_time = Some(now);
        self.rotation = Quat::IDENTITY;
        debug!(
            delay = self.config.start_delay_secs,
            speed = self.speed,
            "Animation armed"
        );
    }

    pub fn stop(&mut self) {
        self.is_running = false;
        self.is_active = false;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.normalized_position = 0.0;
        self.speed = self.config.control_initial_value;
        self.start_time = None;
        self.rotation = Quat::IDENTITY;
    }

    /// Sets the playback speed, clamped to the control range. The current
    /// position is untouched.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(self.config.min_speed, self.config.max_speed);
    }

    pub fn tick(&mut self, now: f64, dt: f32, path: &[Vec3], is_loop: bool) -> AnimatorEvent {
        if !self.is_active {
            return AnimatorEvent::Idle;
        }

        if !self.is_running {
            let elapsed = self.start_time.map_or(0.0, |start| now - start);
            if elapsed < self.config.start_delay_secs {
                return AnimatorEvent::Idle;
            }
            info!(
                "{} second delay complete, starting animation",
                self.config.start_delay_secs
            );
            self.is_running = true;
        }

        if path.len() < 2 {
            return AnimatorEvent::Idle;
        }

        self.normalized_position += self.speed * dt;

        let mut arrived = false;
        if self.normalized_position >= 1.0 {
            if is_loop {
                self.normalized_position %= 1.0;
            } else {
                self.normalized_position = 1.0;
                arrived = true;
            }
        }

        let pose = self.pose_at(path, self.normalized_position);

        if arrived {
            self.stop();
            info!("Animation reached the end of the path");
            AnimatorEvent::Arrived(pose)
        } else {
            AnimatorEvent::Moved(pose)
        }
    }

    fn pose_at(&mut self, path: &[Vec3], t: f32) -> Pose {
        let position = position_along_path(path, t);
        let ahead = position_along_path(path, (t + self.config.look_ahead).min(1.0));

        if let Some(rotation) = look_rotation(ahead - position, Vec3::Y) {
            self.rotation = rotation;
        }

        Pose {
            position,
            rotation: self.rotation,
        }
    }
}

/// Linear interpolation between the two path points bracketing `t`.
///
/// An empty path yields the zero vector; a single point yields itself.
pub fn position_along_path(path: &[Vec3], t: f32) -> Vec3 {
    match path.len() {
        0 => Vec3::ZERO,
        1 => path[0],
        n => {
            let t = t.clamp(0.0, 1.0);
            let segment_count = n - 1;
            let scaled = t * segment_count as f32;
            let segment = (scaled.floor() as usize).min(segment_count - 1);
            let local = scaled - segment as f32;
            path[segment].lerp(path[segment + 1], local)
        }
    }
}

/// Rotation whose local +Z faces `forward`, keeping `up` as close to local +Y
/// as possible. `None` when `forward` is negligible or parallel to `up`.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    if forward.length() <= MIN_FORWARD_LENGTH {
        return None;
    }
    let forward = forward.normalize();
    let right = up.cross(forward).try_normalize()?;
    let up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 10.0),
        ]
    }

    fn config() -> AnimatorConfig {
        AnimatorConfig {
            start_delay_secs: 3.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_position_along_path() {
        let path = path();
        assert_eq!(position_along_path(&path, 0.0), path[0]);
        assert_eq!(position_along_path(&path, 1.0), path[2]);
        assert_eq!(position_along_path(&path, 0.5), path[1]);
        assert_eq!(position_along_path(&path, 0.25), Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(position_along_path(&path, 7.0), path[2]);
        assert_eq!(position_along_path(&[], 0.3), Vec3::ZERO);
        assert_eq!(position_along_path(&path[..1], 0.3), path[0]);
    }

    #[test]
    fn test_waits_for_start_delay() {
        let path = path();
        let mut animator = PathAnimator::new(config());
        animator.start(100.0);

        assert_eq!(animator.tick(101.0, 0.1, &path, false), AnimatorEvent::Idle);
        assert_eq!(animator.tick(102.9, 0.1, &path, false), AnimatorEvent::Idle);
        assert!(!animator.is_running());
        assert_eq!(animator.normalized_position(), 0.0);

        let event = animator.tick(103.0, 0.5, &path, false);
        assert!(matches!(event, AnimatorEvent::Moved(_)));
        assert!(animator.is_running());
        assert!((animator.normalized_position() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_arrives_and_stays_at_end() {
        let path = path();
        let mut animator = PathAnimator::new(config());
        animator.start(0.0);
        animator.set_speed(0.5);

        let mut now = 3.0;
        let mut last = AnimatorEvent::Idle;
        for _ in 0..30 {
            now += 0.1;
            let event = animator.tick(now, 0.1, &path, false);
            if event != AnimatorEvent::Idle {
                last = event;
            }
        }

        match last {
            AnimatorEvent::Arrived(pose) => assert_eq!(pose.position, path[2]),
            other => panic!("expected arrival, got {other:?}"),
        }
        assert_eq!(animator.normalized_position(), 1.0);
        assert!(!animator.is_active());
        assert_eq!(animator.tick(now + 10.0, 0.1, &path, false), AnimatorEvent::Idle);
    }

    #[test]
    fn test_loop_wraps() {
        let path = path();
        let mut animator = PathAnimator::new(config());
        animator.start(0.0);
        animator.set_speed(0.5);

        animator.tick(3.0, 1.0, &path, true);
        assert!((animator.normalized_position() - 0.5).abs() < 1e-6);
        let event = animator.tick(4.0, 1.2, &path, true);
        assert!(matches!(event, AnimatorEvent::Moved(_)));
        assert!((animator.normalized_position() - 0.1).abs() < 1e-5);
        assert!(animator.is_running());
    }

    #[test]
    fn test_speed_is_clamped_and_keeps_position() {
        let path = path();
        let mut animator = PathAnimator::new(config());
        animator.start(0.0);
        assert_eq!(animator.speed(), 0.2);

        animator.tick(3.0, 1.0, &path, false);
        let before = animator.normalized_position();

        animator.set_speed(20.0);
        assert_eq!(animator.speed(), 5.0);
        animator.set_speed(0.1);
        assert_eq!(animator.speed(), 0.5);
        assert_eq!(animator.normalized_position(), before);
    }

    #[test]
    fn test_orientation_faces_travel_direction() {
        let rotation = look_rotation(Vec3::new(0.0, 0.0, 5.0), Vec3::Y).unwrap();
        assert!((rotation * Vec3::Z).distance(Vec3::Z) < 1e-5);

        let rotation = look_rotation(Vec3::new(3.0, 0.0, 0.0), Vec3::Y).unwrap();
        assert!((rotation * Vec3::Z).distance(Vec3::X) < 1e-5);
        assert!((rotation * Vec3::Y).distance(Vec3::Y) < 1e-5);

        assert!(look_rotation(Vec3::new(0.0, 0.0, 0.0005), Vec3::Y).is_none());
    }

    #[test]
    fn test_orientation_kept_at_path_end() {
        let path = path();
        let mut animator = PathAnimator::new(config());
        animator.start(0.0);
        animator.set_speed(0.5);

        let mut last_moving = None;
        let mut now = 3.0;
        loop {
            now += 0.1;
            match animator.tick(now, 0.1, &path, false) {
                AnimatorEvent::Moved(pose) => last_moving = Some(pose),
                AnimatorEvent::Arrived(pose) => {
                    let previous = last_moving.unwrap();
                    assert_eq!(pose.rotation, previous.rotation);
                    break;
                }
                AnimatorEvent::Idle => {}
            }
        }
    }
}
