//! Blade motion estimation.
//!
//! Differentiates the tracked controller pose into velocity, acceleration
//! and angular rates once per fixed step. The derived signals are noisy at
//! tracking rates, so everything except raw velocity is low-pass filtered
//! with exponential smoothing. Only the previous sample is retained.

use glam::{Quat, Vec3};
use std::f32::consts::{PI, TAU};

/// Rotation deltas with an angle below this are treated as "no rotation
/// this tick": the axis of an identity-like delta quaternion is undefined.
const MIN_ROTATION_ANGLE: f32 = 1e-6;

/// A tracked controller pose, delivered once per fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BladePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl BladePose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Smoothed kinematic signals derived from the pose stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicState {
    /// Raw finite-difference velocity (units/s).
    pub linear_velocity: Vec3,
    /// Smoothed linear acceleration (units/s²).
    pub linear_acceleration: Vec3,
    /// Smoothed angular velocity (rad/s).
    pub angular_velocity: Vec3,
    /// Smoothed angular acceleration (rad/s²).
    pub angular_acceleration: Vec3,
}

/// Computes and caches the blade's smoothed kinematic data each fixed step.
#[derive(Debug)]
pub struct BladeKinematics {
    /// Low-pass weight in [0, 1]; smaller = smoother but laggier.
    alpha: f32,
    state: KinematicState,
    prev: Option<PrevSample>,
}

#[derive(Debug, Clone, Copy)]
struct PrevSample {
    position: Vec3,
    velocity: Vec3,
    rotation: Quat,
    angular_velocity: Vec3,
}

impl BladeKinematics {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            state: KinematicState::default(),
            prev: None,
        }
    }

    /// The latest smoothed state.
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Advance the estimator by one fixed step of `dt` seconds (`dt` > 0).
    ///
    /// The first sample seeds the previous pose with the current one, so
    /// the initial velocity and accelerations come out zero.
    pub fn sample(&mut self, pose: &BladePose, dt: f32) -> &KinematicState {
        let prev = self.prev.unwrap_or(PrevSample {
            position: pose.position,
            velocity: Vec3::ZERO,
            rotation: pose.rotation,
            angular_velocity: Vec3::ZERO,
        });

        // Linear motion
        let velocity = (pose.position - prev.position) / dt;
        let raw_accel = (velocity - prev.velocity) / dt;

        // Angular motion
        let raw_ang_vel = rotation_rate(prev.rotation, pose.rotation, dt);
        let raw_ang_accel = (raw_ang_vel - prev.angular_velocity) / dt;

        // Low-pass filter the derived signals; velocity stays raw.
        self.state.linear_velocity = velocity;
        self.state.linear_acceleration = self.state.linear_acceleration.lerp(raw_accel, self.alpha);
        self.state.angular_velocity = self.state.angular_velocity.lerp(raw_ang_vel, self.alpha);
        self.state.angular_acceleration = self
            .state
            .angular_acceleration
            .lerp(raw_ang_accel, self.alpha);

        // Roll state forward
        self.prev = Some(PrevSample {
            position: pose.position,
            velocity,
            rotation: pose.rotation,
            angular_velocity: raw_ang_vel,
        });
        &self.state
    }
}

/// Angular velocity of the rotation taking `from` to `to` over `dt`,
/// following the shortest signed path.
fn rotation_rate(from: Quat, to: Quat, dt: f32) -> Vec3 {
    let delta = to * from.inverse();
    let (axis, mut angle) = delta.to_axis_angle();
    if angle > PI {
        angle -= TAU;
    }
    if angle.abs() < MIN_ROTATION_ANGLE || !axis.is_finite() {
        return Vec3::ZERO;
    }
    axis * angle / dt
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn assert_finite(state: &KinematicState) {
        assert!(state.linear_velocity.is_finite());
        assert!(state.linear_acceleration.is_finite());
        assert!(state.angular_velocity.is_finite());
        assert!(state.angular_acceleration.is_finite());
    }

    #[test]
    fn stationary_pose_yields_zero_finite_state() {
        let mut kin = BladeKinematics::new(0.15);
        let pose = BladePose::new(Vec3::new(0.3, 1.2, 0.7), Quat::IDENTITY);
        for _ in 0..10 {
            let state = kin.sample(&pose, DT);
            assert_finite(state);
            assert_eq!(state.linear_velocity, Vec3::ZERO);
            assert_eq!(state.linear_acceleration, Vec3::ZERO);
            assert_eq!(state.angular_velocity, Vec3::ZERO);
        }
    }

    #[test]
    fn zero_length_rotation_delta_stays_finite() {
        let mut kin = BladeKinematics::new(0.3);
        // Identical rotations every tick: the delta quaternion is identity
        // and its axis is undefined.
        let rot = Quat::from_rotation_y(0.8);
        for i in 0..20 {
            let pose = BladePose::new(Vec3::new(i as f32 * 0.01, 1.0, 0.0), rot);
            assert_finite(kin.sample(&pose, DT));
        }
    }

    #[test]
    fn constant_acceleration_converges_geometrically() {
        let alpha = 0.25;
        let accel = Vec3::new(0.0, 0.0, 4.0);
        let mut kin = BladeKinematics::new(alpha);

        // Quadratic motion: finite differencing recovers the acceleration
        // exactly from the third sample onward.
        let pos = |k: u32| accel * 0.5 * (k as f32 * DT).powi(2);
        kin.sample(&BladePose::new(pos(0), Quat::IDENTITY), DT);
        kin.sample(&BladePose::new(pos(1), Quat::IDENTITY), DT);

        let n = 20;
        for k in 2..2 + n {
            kin.sample(&BladePose::new(pos(k), Quat::IDENTITY), DT);
        }

        // After n ticks of a constant raw input the smoothed estimate is
        // within (1-alpha)^n of the truth (plus float noise).
        let bound = (1.0 - alpha).powi(n as i32) * accel.length() + 1e-3;
        let err = (kin.state().linear_acceleration - accel).length();
        assert!(err <= bound, "err {err} > bound {bound}");
    }

    #[test]
    fn rotation_rate_takes_shortest_path() {
        // A 350 degree turn is reported as -10 degrees.
        let axis = Vec3::Y;
        let to = Quat::from_axis_angle(axis, 350.0_f32.to_radians());
        let rate = rotation_rate(Quat::IDENTITY, to, DT);
        let expected = axis * (-10.0_f32.to_radians()) / DT;
        assert!((rate - expected).length() < 1e-2, "rate {rate:?}");
    }

    #[test]
    fn smoothed_state_is_convex_blend() {
        let alpha = 0.4;
        let mut kin = BladeKinematics::new(alpha);
        let mut prev_rot = Quat::IDENTITY;
        kin.sample(&BladePose::new(Vec3::ZERO, prev_rot), DT);
        for i in 1..30 {
            let rot = Quat::from_rotation_x(i as f32 * 0.1);
            let raw = rotation_rate(prev_rot, rot, DT);
            let expected = kin.state().angular_velocity.lerp(raw, alpha);
            let state = *kin.sample(&BladePose::new(Vec3::ZERO, rot), DT);
            assert!((state.angular_velocity - expected).length() < 1e-4);
            prev_rot = rot;
        }
    }
}
