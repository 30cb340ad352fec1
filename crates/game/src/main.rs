//! Slicestorm - headless core of a VR sword-slicing minigame.
//!
//! Runs a scripted round: balls arc up in front of the player while a
//! synthetic controller swing sweeps the blade back and forth through the
//! play volume. Slices and the final score go to the log.

mod ball;
mod config;
mod cutter;
mod kinematics;
mod session;
mod spawner;
mod state;
mod update;

use anyhow::Result;
use glam::{Quat, Vec3};
use std::path::Path;

use config::GameConfig;
use kinematics::BladePose;
use state::GameState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load_from(Path::new(&path))?,
        None => GameConfig::load(),
    };

    // SLICESTORM_SEED makes a run reproducible; otherwise seed from the OS.
    let mut state = match std::env::var("SLICESTORM_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        Some(seed) => GameState::with_seed(config, seed),
        None => GameState::new(config),
    };
    state.start_round();

    // Drive the simulation at a VR-ish host frame rate; the simulation
    // itself steps at its own fixed rate underneath.
    let frame_dt = 1.0 / 90.0;
    let mut frame: u64 = 0;
    while state.round_running() {
        let pose = swing_pose(state.elapsed_seconds());
        state.update(frame_dt, &pose);

        frame += 1;
        if frame % 450 == 0 {
            let k = state.blade.kinematics.state();
            log::debug!(
                "t={:.1}s remaining={:.1}s blade: v={:.1} a={:.1} w={:.1} dw={:.1}",
                state.elapsed_seconds(),
                state.round.time_remaining(),
                k.linear_velocity.length(),
                k.linear_acceleration.length(),
                k.angular_velocity.length(),
                k.angular_acceleration.length(),
            );
        }
    }

    log::info!(
        "simulated {:.1}s, final score {}",
        state.elapsed_seconds(),
        state.score()
    );
    Ok(())
}

/// Synthetic controller swing: a horizontal sweep through the spawn arc at
/// sword height, with a slow vertical drift and a mild wrist roll. Peak
/// speed sits well above the slice threshold; the sweep endpoints dip
/// below it, so grazes show up too.
fn swing_pose(t: f64) -> BladePose {
    let t = t as f32;
    let x = 1.3 * (2.2 * t).sin();
    let y = 1.2 + 0.15 * (0.9 * t).sin();
    let position = Vec3::new(x, y, 1.45);
    let rotation = Quat::from_rotation_y(0.35 * (2.2 * t).cos());
    BladePose::new(position, rotation)
}
