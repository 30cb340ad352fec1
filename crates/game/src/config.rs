//! Game tuning configuration. Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised when an explicitly requested config file cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Tuning knobs for the whole simulation. Loaded from `config.ron` in the
/// current directory; missing fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    // ── Blade motion estimation ─────────────────────────────────────────
    /// Low-pass weight for the kinematic filter (0 = max smooth).
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    // ── Cut detection ───────────────────────────────────────────────────
    /// Minimum blade speed (units/s) required to register a slice.
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f32,
    /// Entry/exit pairs closer than this cannot define a plane.
    #[serde(default = "default_min_cut_separation")]
    pub min_cut_separation: f32,
    /// Local axis of the blade representing the flat of the blade.
    #[serde(default = "default_blade_normal_local")]
    pub blade_normal_local: [f32; 3],
    /// Half extents of the blade's sensor volume.
    #[serde(default = "default_blade_half_extents")]
    pub blade_half_extents: [f32; 3],

    // ── Cut reaction ────────────────────────────────────────────────────
    /// Separation impulse per unit of blade speed.
    #[serde(default = "default_impulse_factor")]
    pub impulse_factor: f32,
    /// Seconds after hitting the ground before an un-cut ball despawns.
    #[serde(default = "default_ground_despawn_delay")]
    pub ground_despawn_delay: f32,
    /// Seconds before sliced-off pieces despawn.
    #[serde(default = "default_piece_despawn_delay")]
    pub piece_despawn_delay: f32,
    /// Grace delay before a cut original is removed.
    #[serde(default = "default_removal_grace")]
    pub removal_grace: f32,
    /// Balls falling below this height are destroyed outright.
    #[serde(default = "default_floor_kill_y")]
    pub floor_kill_y: f32,

    // ── Round & spawning ────────────────────────────────────────────────
    /// Round length in seconds.
    #[serde(default = "default_round_duration")]
    pub round_duration: f32,
    /// Minimum delay between spawns (seconds).
    #[serde(default = "default_min_spawn_interval")]
    pub min_spawn_interval: f32,
    /// Maximum delay between spawns (seconds).
    #[serde(default = "default_max_spawn_interval")]
    pub max_spawn_interval: f32,
    /// Width of the spawn arc in front of the player, in degrees.
    #[serde(default = "default_arc_degrees")]
    pub arc_degrees: f32,
    /// Nearest spawn distance from the player (units).
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    /// Farthest spawn distance from the player (units).
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Lowest spawn height (waist-ish).
    #[serde(default = "default_min_height")]
    pub min_height: f32,
    /// Highest spawn height (head-ish).
    #[serde(default = "default_max_height")]
    pub max_height: f32,
    /// Launch speed range (units/s).
    #[serde(default = "default_launch_speed_min")]
    pub launch_speed_min: f32,
    #[serde(default = "default_launch_speed_max")]
    pub launch_speed_max: f32,
    /// Ball collision radius.
    #[serde(default = "default_ball_radius")]
    pub ball_radius: f32,
}

fn default_alpha() -> f32 {
    0.15
}
fn default_velocity_threshold() -> f32 {
    1.0
}
fn default_min_cut_separation() -> f32 {
    0.01
}
fn default_blade_normal_local() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}
fn default_blade_half_extents() -> [f32; 3] {
    [0.03, 0.6, 0.03]
}
fn default_impulse_factor() -> f32 {
    0.8
}
fn default_ground_despawn_delay() -> f32 {
    2.0
}
fn default_piece_despawn_delay() -> f32 {
    1.5
}
fn default_removal_grace() -> f32 {
    0.1
}
fn default_floor_kill_y() -> f32 {
    -10.0
}
fn default_round_duration() -> f32 {
    45.0
}
fn default_min_spawn_interval() -> f32 {
    0.8
}
fn default_max_spawn_interval() -> f32 {
    1.8
}
fn default_arc_degrees() -> f32 {
    100.0
}
fn default_min_distance() -> f32 {
    1.2
}
fn default_max_distance() -> f32 {
    1.7
}
fn default_min_height() -> f32 {
    0.7
}
fn default_max_height() -> f32 {
    1.6
}
fn default_launch_speed_min() -> f32 {
    5.0
}
fn default_launch_speed_max() -> f32 {
    6.0
}
fn default_ball_radius() -> f32 {
    0.3
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            velocity_threshold: default_velocity_threshold(),
            min_cut_separation: default_min_cut_separation(),
            blade_normal_local: default_blade_normal_local(),
            blade_half_extents: default_blade_half_extents(),
            impulse_factor: default_impulse_factor(),
            ground_despawn_delay: default_ground_despawn_delay(),
            piece_despawn_delay: default_piece_despawn_delay(),
            removal_grace: default_removal_grace(),
            floor_kill_y: default_floor_kill_y(),
            round_duration: default_round_duration(),
            min_spawn_interval: default_min_spawn_interval(),
            max_spawn_interval: default_max_spawn_interval(),
            arc_degrees: default_arc_degrees(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            min_height: default_min_height(),
            max_height: default_max_height(),
            launch_speed_min: default_launch_speed_min(),
            launch_speed_max: default_launch_speed_max(),
            ball_radius: default_ball_radius(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. A missing file yields the defaults
    /// silently; an unreadable or invalid one logs and falls back.
    pub fn load() -> Self {
        let path = config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.ron")
}
