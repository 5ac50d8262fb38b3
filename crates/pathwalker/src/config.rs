//! Tunable constants of a walking session.

use std::{env, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    errors::PathError,
    models::{BoardOptions, LeaderboardCategory},
};

/// Centimetres per second to miles per hour.
pub const CM_PER_SEC_TO_MPH: f32 = 0.022_369_363;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frames with a shorter delta are skipped (capture-rate frames).
    pub min_frame_delta: f32,
    /// Multiplier from raw pace units to the displayed speed unit.
    pub pace_display_factor: f32,
    /// Over-speed warning threshold, in display units.
    pub speed_warning_threshold: f32,
    /// Raw pace above which the UI is hidden.
    pub ui_hide_pace_threshold: f32,
    /// Resolution handed to the mesh builder.
    pub mesh_resolution: u32,
    pub animator: AnimatorConfig,
    pub leaderboard: LeaderboardConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_frame_delta: 1.0 / 6000.0,
            pace_display_factor: CM_PER_SEC_TO_MPH,
            speed_warning_threshold: 15.0,
            ui_hide_pace_threshold: 13.0,
            mesh_resolution: 60,
            animator: AnimatorConfig::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Seconds between `start()` and the first motion.
    pub start_delay_secs: f64,
    pub default_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Value the speed control shows when it is first presented.
    pub control_initial_value: f32,
    /// Parameter offset sampled ahead of the follower to orient it.
    pub look_ahead: f32,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            start_delay_secs: 3.0,
            default_speed: 0.2,
            min_speed: 0.5,
            max_speed: 5.0,
            control_initial_value: 1.0,
            look_ahead: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub lap_time_board: String,
    pub distance_board: String,
    pub ttl_seconds: u64,
    /// Shown when no personal best can be fetched.
    pub placeholder: String,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            lap_time_board: "RUNNING_BUDDIES_LAP_TIME".to_string(),
            distance_board: "RUNNING_BUDDIES_DISTANCE".to_string(),
            ttl_seconds: 800_000,
            placeholder: "N/A".to_string(),
        }
    }
}

impl LeaderboardConfig {
    pub fn board(&self, category: LeaderboardCategory) -> BoardOptions {
        let name = match category {
            LeaderboardCategory::LapTime => self.lap_time_board.clone(),
            LeaderboardCategory::Distance => self.distance_board.clone(),
        };
        BoardOptions {
            name,
            category,
            ordering: category.ordering(),
            ttl_seconds: self.ttl_seconds,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `PATHWALKER_*` environment variables.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.speed_warning_threshold =
            env_or("PATHWALKER_SPEED_WARNING", config.speed_warning_threshold);
        config.ui_hide_pace_threshold =
            env_or("PATHWALKER_UI_HIDE_PACE", config.ui_hide_pace_threshold);
        config.mesh_resolution = env_or("PATHWALKER_MESH_RESOLUTION", config.mesh_resolution);
        config.animator.start_delay_secs =
            env_or("PATHWALKER_ANIMATION_DELAY", config.animator.start_delay_secs);
        config.animator.default_speed =
            env_or("PATHWALKER_ANIMATION_SPEED", config.animator.default_speed);

        if let Ok(name) = env::var("PATHWALKER_LAP_TIME_BOARD") {
            config.leaderboard.lap_time_board = name;
        }
        if let Ok(name) = env::var("PATHWALKER_DISTANCE_BOARD") {
            config.leaderboard.distance_board = name;
        }
        config.leaderboard.ttl_seconds =
            env_or("PATHWALKER_LEADERBOARD_TTL", config.leaderboard.ttl_seconds);

        config
    }

    pub fn from_json_str(json: &str) -> Result<Self, PathError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PathError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), PathError> {
        if !(self.min_frame_delta >= 0.0) {
            return Err(PathError::Config(format!(
                "min_frame_delta must be non-negative, got {}",
                self.min_frame_delta
            )));
        }
        if self.animator.default_speed <= 0.0 {
            return Err(PathError::Config(
                "animator.default_speed must be positive".to_string(),
            ));
        }
        if self.animator.min_speed <= 0.0 || self.animator.min_speed > self.animator.max_speed {
            return Err(PathError::Config(format!(
                "animator speed range {}..{} is invalid",
                self.animator.min_speed, self.animator.max_speed
            )));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderingPolicy;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!((config.min_frame_delta - 1.0 / 6000.0).abs() < f32::EPSILON);
        assert_eq!(config.speed_warning_threshold, 15.0);
        assert_eq!(config.mesh_resolution, 60);
        assert_eq!(config.animator.start_delay_secs, 3.0);
        assert_eq!(config.leaderboard.ttl_seconds, 800_000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SessionConfig::from_json_str(r#"{ "animator": { "default_speed": 0.4 } }"#).unwrap();
        assert_eq!(config.animator.default_speed, 0.4);
        assert_eq!(config.animator.max_speed, 5.0);
        assert_eq!(config.ui_hide_pace_threshold, 13.0);
    }

    #[test]
    fn test_invalid_speed_range_rejected() {
        let result = SessionConfig::from_json_str(
            r#"{ "animator": { "min_speed": 6.0, "max_speed": 5.0 } }"#,
        );
        assert!(matches!(result, Err(PathError::Config(_))));
    }

    #[test]
    fn test_board_options() {
        let config = LeaderboardConfig::default();
        let lap = config.board(LeaderboardCategory::LapTime);
        assert_eq!(lap.name, "RUNNING_BUDDIES_LAP_TIME");
        assert_eq!(lap.ordering, OrderingPolicy::LowerIsBetter);

        let distance = config.board(LeaderboardCategory::Distance);
        assert_eq!(distance.ordering, OrderingPolicy::HigherIsBetter);
    }
}
