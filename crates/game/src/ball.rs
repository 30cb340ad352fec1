//! Throwable balls and their cut reaction.
//!
//! A ball lives as a rapier dynamic body until it is sliced. The two
//! resulting pieces are plain ECS entities integrated debris-style (gravity,
//! tumble, ground bounce) until their lifetimes expire.

use engine_core::{Lifetime, Transform, Vec3, Velocity};
use glam::Quat;
use hecs::{Entity, World};
use physics::{PhysicsBody, PhysicsWorld};
use rand::prelude::*;

use crate::cutter::CutEvent;
use crate::session::ScoreSink;

/// A thrown ball the blade can slice.
#[derive(Debug, Clone, Copy)]
pub struct ThrownBall {
    /// Collision radius.
    pub radius: f32,
    /// Set once by a successful cut; never cleared.
    pub has_been_cut: bool,
    /// Set once by the first ground contact; never cleared.
    pub hit_ground: bool,
    /// Seconds until an un-cut grounded ball despawns.
    pub ground_despawn: Option<f32>,
}

impl ThrownBall {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            has_been_cut: false,
            hit_ground: false,
            ground_despawn: None,
        }
    }
}

/// Half of a sliced ball, integrated without a physics body.
#[derive(Debug, Clone, Copy)]
pub struct BallPiece {
    pub angular_velocity: Vec3,
}

/// Tuning for the cut reaction.
#[derive(Debug, Clone, Copy)]
pub struct CutTuning {
    /// Separation impulse per unit of blade speed.
    pub impulse_factor: f32,
    /// Seconds before spawned pieces despawn.
    pub piece_despawn_delay: f32,
    /// Grace delay before the disabled original is removed; keeps the
    /// entity alive through the event dispatch that cut it.
    pub removal_grace: f32,
}

/// Geometry of one piece produced by a split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceShape {
    /// Piece centroid relative to the ball center.
    pub offset: Vec3,
    /// Equivalent-volume radius of the piece.
    pub radius: f32,
}

/// Splits a ball shape along a plane. The geometric slice itself lives
/// behind this seam; implementations may fail, in which case the ball is
/// left exactly as it was.
pub trait BodySplitter {
    fn split(
        &self,
        center: Vec3,
        radius: f32,
        plane_point: Vec3,
        plane_normal: Vec3,
    ) -> Option<[PieceShape; 2]>;
}

/// Splits a sphere into the two spherical caps on either side of the plane.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapSplitter;

impl BodySplitter for CapSplitter {
    fn split(
        &self,
        center: Vec3,
        radius: f32,
        plane_point: Vec3,
        plane_normal: Vec3,
    ) -> Option<[PieceShape; 2]> {
        let normal = plane_normal.try_normalize()?;
        // Signed distance from the plane to the ball center.
        let d = (center - plane_point).dot(normal);
        if d.abs() >= radius {
            // The plane misses the ball entirely.
            return None;
        }
        Some([
            cap_piece(radius, radius + d, normal),
            cap_piece(radius, radius - d, -normal),
        ])
    }
}

/// Spherical cap of height `h` on a sphere of radius `r`, described by its
/// centroid offset along `dir` and an equivalent-volume radius.
fn cap_piece(r: f32, h: f32, dir: Vec3) -> PieceShape {
    // Cap volume pi*h^2*(3r - h)/3 over sphere volume 4*pi*r^3/3.
    let volume_ratio = (h * h * (3.0 * r - h)) / (4.0 * r * r * r);
    // Cap centroid distance from the sphere center: 3(2r - h)^2 / (4(3r - h)).
    let centroid = 3.0 * (2.0 * r - h).powi(2) / (4.0 * (3.0 * r - h));
    PieceShape {
        offset: dir * centroid,
        radius: r * volume_ratio.cbrt(),
    }
}

/// First ground contact while un-cut arms the despawn timer; everything
/// after that is a no-op.
pub fn arm_ground_despawn(ball: &mut ThrownBall, delay: f32) {
    if ball.has_been_cut || ball.hit_ground {
        return;
    }
    ball.hit_ground = true;
    ball.ground_despawn = Some(delay);
}

/// Attempt to slice `entity` with the supplied cut.
///
/// Returns true when the split happened. On any failure (already cut, or
/// the splitter cannot produce pieces for this plane) the ball is left
/// exactly as it was and stays sliceable.
#[allow(clippy::too_many_arguments)]
pub fn apply_cut(
    world: &mut World,
    physics: &mut PhysicsWorld,
    entity: Entity,
    cut: &CutEvent,
    tuning: &CutTuning,
    splitter: &dyn BodySplitter,
    score: &mut dyn ScoreSink,
    rng: &mut StdRng,
) -> bool {
    let (center, radius, already_cut) = match world.query_one_mut::<(&Transform, &ThrownBall)>(entity)
    {
        Ok((transform, ball)) => (transform.position, ball.radius, ball.has_been_cut),
        Err(_) => return false,
    };
    if already_cut {
        return false;
    }
    let Some(normal) = cut.plane_normal.try_normalize() else {
        return false;
    };
    let Some(pieces) = splitter.split(center, radius, cut.plane_point, normal) else {
        log::debug!("cut rejected: plane missed ball {:?}", entity);
        return false;
    };

    // Freeze the original: no more collisions or dynamics while it waits
    // out the removal grace period.
    let body_handle = world
        .get::<&PhysicsBody>(entity)
        .ok()
        .map(|body| body.rigid_body);
    if let Some(handle) = body_handle {
        physics.set_body_enabled(handle, false);
    }
    if let Ok(ball) = world.query_one_mut::<&mut ThrownBall>(entity) {
        ball.has_been_cut = true;
    }
    let _ = world.insert_one(entity, Lifetime::new(tuning.removal_grace));

    // Two halves flying apart along the plane normal, faster for a faster
    // strike.
    let impulse = normal * (cut.velocity.length() * tuning.impulse_factor);
    for (index, shape) in pieces.iter().enumerate() {
        let sign = if index == 0 { 1.0 } else { -1.0 };
        let fly_dir = normal * sign;
        let tumble = Vec3::new(
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
        );
        world.spawn((
            Transform {
                position: center + shape.offset,
                rotation: Quat::from_rotation_arc(-Vec3::Z, fly_dir),
                scale: Vec3::splat(shape.radius),
            },
            Velocity::with_angular(impulse * sign, tumble),
            BallPiece {
                angular_velocity: tumble,
            },
            Lifetime::new(tuning.piece_despawn_delay),
        ));
    }

    score.increment();
    log::debug!(
        "sliced {:?} at {:?}, impulse {:.2}",
        entity,
        cut.plane_point,
        impulse.length()
    );
    true
}

/// Integrate piece motion without physics bodies: gravity, tumble, ground
/// bounce and damping.
pub fn update_pieces(world: &mut World, dt: f32) {
    let gravity = Vec3::new(0.0, -9.81, 0.0);

    for (_, (transform, velocity, piece)) in
        world.query_mut::<(&mut Transform, &mut Velocity, &BallPiece)>()
    {
        velocity.linear += gravity * dt;
        transform.position += velocity.linear * dt;

        let spin = Quat::from_scaled_axis(piece.angular_velocity * dt);
        transform.rotation = spin * transform.rotation;

        // Ground plane at y = 0; pieces rest on their equivalent radius.
        let surface = transform.scale.x;
        if transform.position.y < surface {
            transform.position.y = surface;
            velocity.linear.y = -velocity.linear.y * 0.3; // Bounce
            velocity.linear.x *= 0.8; // Friction
            velocity.linear.z *= 0.8;
        }

        velocity.linear *= 0.99;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const TUNING: CutTuning = CutTuning {
        impulse_factor: 0.8,
        piece_despawn_delay: 1.5,
        removal_grace: 0.1,
    };

    #[derive(Default)]
    struct CountingSink {
        count: u32,
    }

    impl ScoreSink for CountingSink {
        fn increment(&mut self) {
            self.count += 1;
        }
    }

    fn spawn_ball(world: &mut World, position: Vec3, radius: f32) -> Entity {
        world.spawn((Transform::from_position(position), ThrownBall::new(radius)))
    }

    fn cut_through(center: Vec3, velocity: Vec3) -> CutEvent {
        CutEvent {
            plane_point: center,
            plane_normal: Vec3::X,
            velocity,
        }
    }

    fn piece_velocities(world: &mut World) -> Vec<Vec3> {
        world
            .query_mut::<(&Velocity, &BallPiece)>()
            .into_iter()
            .map(|(_, (velocity, _))| velocity.linear)
            .collect()
    }

    #[test]
    fn center_split_yields_two_equal_hemispheres() {
        let [a, b] = CapSplitter
            .split(Vec3::ZERO, 0.4, Vec3::ZERO, Vec3::X)
            .expect("plane through center splits");
        assert!((a.radius - b.radius).abs() < 1e-6);
        // Hemisphere centroid sits 3r/8 from the center.
        assert!((a.offset - Vec3::X * 0.15).length() < 1e-6);
        assert!((b.offset + Vec3::X * 0.15).length() < 1e-6);
        // Volumes sum to the whole sphere.
        let total = a.radius.powi(3) + b.radius.powi(3);
        assert!((total - 0.4_f32.powi(3)).abs() < 1e-6);
    }

    #[test]
    fn offset_split_is_unequal_and_miss_fails() {
        let [a, b] = CapSplitter
            .split(Vec3::ZERO, 0.4, Vec3::X * 0.2, Vec3::X)
            .expect("plane inside the ball splits");
        assert!(a.radius > b.radius);

        assert!(CapSplitter
            .split(Vec3::ZERO, 0.4, Vec3::X * 0.5, Vec3::X)
            .is_none());
    }

    #[test]
    fn cut_is_idempotent_and_scores_once() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = CountingSink::default();

        let center = Vec3::new(0.0, 1.0, 0.0);
        let ball = spawn_ball(&mut world, center, 0.4);
        let cut = cut_through(center, Vec3::new(0.0, 0.0, 10.0));

        assert!(apply_cut(
            &mut world, &mut physics, ball, &cut, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));
        assert!(!apply_cut(
            &mut world, &mut physics, ball, &cut, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));

        assert_eq!(sink.count, 1);
        assert_eq!(piece_velocities(&mut world).len(), 2);
        assert!(world.get::<&ThrownBall>(ball).unwrap().has_been_cut);
    }

    #[test]
    fn failed_split_leaves_the_ball_untouched_and_retryable() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = CountingSink::default();

        let center = Vec3::new(0.0, 1.0, 0.0);
        let ball = spawn_ball(&mut world, center, 0.4);
        let miss = CutEvent {
            plane_point: center + Vec3::X * 2.0,
            plane_normal: Vec3::X,
            velocity: Vec3::new(0.0, 0.0, 10.0),
        };

        assert!(!apply_cut(
            &mut world, &mut physics, ball, &miss, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));
        assert_eq!(sink.count, 0);
        assert!(!world.get::<&ThrownBall>(ball).unwrap().has_been_cut);
        assert!(world.get::<&Lifetime>(ball).is_err());

        // A later, better-aimed cut still works.
        let hit = cut_through(center, Vec3::new(0.0, 0.0, 10.0));
        assert!(apply_cut(
            &mut world, &mut physics, ball, &hit, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));
        assert_eq!(sink.count, 1);
    }

    #[test]
    fn impulse_scales_strictly_with_strike_speed() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = CountingSink::default();

        let slow_ball = spawn_ball(&mut world, Vec3::new(0.0, 1.0, 0.0), 0.4);
        let slow = cut_through(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 5.0));
        assert!(apply_cut(
            &mut world, &mut physics, slow_ball, &slow, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));
        let slow_speed = piece_velocities(&mut world)[0].length();

        let mut world2 = World::new();
        let fast_ball = spawn_ball(&mut world2, Vec3::new(0.0, 1.0, 0.0), 0.4);
        let fast = cut_through(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 20.0));
        assert!(apply_cut(
            &mut world2, &mut physics, fast_ball, &fast, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));
        let fast_speed = piece_velocities(&mut world2)[0].length();

        assert!(fast_speed > slow_speed);
        // Both pieces carry equal and opposite impulses.
        let vels = piece_velocities(&mut world2);
        assert!((vels[0] + vels[1]).length() < 1e-5);
    }

    #[test]
    fn pieces_face_away_from_each_other_along_the_normal() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = CountingSink::default();

        let center = Vec3::new(0.0, 1.0, 0.0);
        let ball = spawn_ball(&mut world, center, 0.4);
        let cut = cut_through(center, Vec3::new(0.0, 0.0, 10.0));
        assert!(apply_cut(
            &mut world, &mut physics, ball, &cut, &TUNING, &CapSplitter, &mut sink, &mut rng,
        ));

        let forwards: Vec<Vec3> = world
            .query_mut::<(&Transform, &BallPiece)>()
            .into_iter()
            .map(|(_, (transform, _))| transform.forward())
            .collect();
        assert!((forwards[0] - Vec3::X).length() < 1e-4 || (forwards[0] + Vec3::X).length() < 1e-4);
        assert!((forwards[0] + forwards[1]).length() < 1e-4);
    }

    #[test]
    fn ground_despawn_arms_exactly_once() {
        let mut ball = ThrownBall::new(0.4);
        arm_ground_despawn(&mut ball, 2.0);
        assert!(ball.hit_ground);
        assert_eq!(ball.ground_despawn, Some(2.0));

        // Tick the timer a little, then bounce again: the timer is not
        // re-armed.
        ball.ground_despawn = Some(1.3);
        arm_ground_despawn(&mut ball, 2.0);
        assert_eq!(ball.ground_despawn, Some(1.3));
    }

    #[test]
    fn cut_ball_never_arms_the_ground_timer() {
        let mut ball = ThrownBall::new(0.4);
        ball.has_been_cut = true;
        arm_ground_despawn(&mut ball, 2.0);
        assert!(!ball.hit_ground);
        assert_eq!(ball.ground_despawn, None);
    }

    #[test]
    fn pieces_fall_and_bounce_on_the_ground() {
        let mut world = World::new();
        let piece = world.spawn((
            Transform {
                position: Vec3::new(0.0, 0.5, 0.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::splat(0.3),
            },
            Velocity::new(Vec3::new(0.0, -5.0, 0.0)),
            BallPiece {
                angular_velocity: Vec3::new(1.0, 0.0, 0.0),
            },
        ));

        for _ in 0..6 {
            update_pieces(&mut world, 0.02);
        }
        let (transform, velocity) = {
            let mut query = world.query_one::<(&Transform, &Velocity)>(piece).unwrap();
            let (t, v) = query.get().unwrap();
            (*t, *v)
        };
        // The fall was reflected upward and the piece never sinks below its
        // resting radius.
        assert!(transform.position.y >= 0.3 - 1e-4);
        assert!(velocity.linear.y > 0.0);
    }
}
