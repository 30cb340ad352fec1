//! Arc ball spawner.
//!
//! Spawns balls on a horizontal arc in front of the player at random
//! intervals, always within blade reach and launched up and slightly
//! inward so they pass through the play volume.

use engine_core::{Transform, Vec3};
use hecs::{Entity, World};
use physics::{ColliderHandle, PhysicsBody, PhysicsWorld};
use rand::prelude::*;

use crate::ball::ThrownBall;
use crate::config::GameConfig;

/// Spawns throwable balls while the round runs.
pub struct BallSpawner {
    // ── Spawn timing ────────────────────────────────────────────────────
    min_interval: f32,
    max_interval: f32,
    /// Seconds until the next spawn.
    next_spawn: f32,

    // ── Arc & distance ──────────────────────────────────────────────────
    arc_degrees: f32,
    min_distance: f32,
    max_distance: f32,
    min_height: f32,
    max_height: f32,

    // ── Launch ──────────────────────────────────────────────────────────
    launch_speed_min: f32,
    launch_speed_max: f32,
    ball_radius: f32,

    rng: StdRng,
}

impl BallSpawner {
    pub fn from_config(config: &GameConfig, mut rng: StdRng) -> Self {
        let next_spawn = rng.gen_range(config.min_spawn_interval..config.max_spawn_interval);
        Self {
            min_interval: config.min_spawn_interval,
            max_interval: config.max_spawn_interval,
            next_spawn,
            arc_degrees: config.arc_degrees,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_height: config.min_height,
            max_height: config.max_height,
            launch_speed_min: config.launch_speed_min,
            launch_speed_max: config.launch_speed_max,
            ball_radius: config.ball_radius,
            rng,
        }
    }

    /// Advance the spawn timer, spawning as many balls as it elapsed over.
    /// Returns the spawned entities with their collider handles so the
    /// caller can register them for event routing.
    pub fn update(
        &mut self,
        dt: f32,
        world: &mut World,
        physics: &mut PhysicsWorld,
    ) -> Vec<(Entity, ColliderHandle)> {
        let mut spawned = Vec::new();
        self.next_spawn -= dt;
        while self.next_spawn <= 0.0 {
            spawned.push(self.spawn_ball(world, physics));
            self.next_spawn += self.rng.gen_range(self.min_interval..self.max_interval);
        }
        spawned
    }

    fn spawn_ball(
        &mut self,
        world: &mut World,
        physics: &mut PhysicsWorld,
    ) -> (Entity, ColliderHandle) {
        // Position on the arc, centered straight ahead (+Z from the origin).
        let half_arc = self.arc_degrees.to_radians() * 0.5;
        let angle = self.rng.gen_range(-half_arc..half_arc);
        let distance = self.rng.gen_range(self.min_distance..self.max_distance);
        let height = self.rng.gen_range(self.min_height..self.max_height);
        let position = Vec3::new(angle.sin() * distance, height, angle.cos() * distance);

        // Launch up and slightly toward the player, with a little spread.
        let speed = self.rng.gen_range(self.launch_speed_min..self.launch_speed_max);
        let inward = Vec3::new(-position.x, 0.0, -position.z).normalize_or_zero() * 0.15;
        let spread = Vec3::new(
            self.rng.gen_range(-0.1..0.1),
            0.0,
            self.rng.gen_range(-0.05..0.05),
        );
        let direction = (Vec3::Y + inward + spread).normalize();
        let angvel = Vec3::new(
            self.rng.gen_range(-5.0..5.0),
            self.rng.gen_range(-5.0..5.0),
            self.rng.gen_range(-5.0..5.0),
        );

        let (body, collider) =
            physics.add_dynamic_ball(position, direction * speed, angvel, self.ball_radius);
        let entity = world.spawn((
            Transform {
                position,
                scale: Vec3::splat(self.ball_radius),
                ..Default::default()
            },
            ThrownBall::new(self.ball_radius),
            PhysicsBody::new(body, collider),
        ));
        log::debug!("spawned ball {:?} at {:?}", entity, position);
        (entity, collider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawner() -> BallSpawner {
        BallSpawner::from_config(&GameConfig::default(), StdRng::seed_from_u64(42))
    }

    #[test]
    fn spawns_respect_interval_bounds() {
        let config = GameConfig::default();
        let mut spawner = spawner();
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();

        // Nothing before the minimum interval has elapsed.
        assert!(spawner
            .update(config.min_spawn_interval * 0.5, &mut world, &mut physics)
            .is_empty());

        // Stepping a full maximum interval must produce at least one ball.
        let spawned = spawner.update(config.max_spawn_interval, &mut world, &mut physics);
        assert!(!spawned.is_empty());
    }

    #[test]
    fn spawn_positions_stay_inside_the_arc() {
        let config = GameConfig::default();
        let mut spawner = spawner();
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();

        // Force a burst of spawns.
        let spawned = spawner.update(60.0, &mut world, &mut physics);
        assert!(spawned.len() > 10);

        let half_arc = config.arc_degrees.to_radians() * 0.5;
        for (entity, _) in spawned {
            let transform = *world.get::<&Transform>(entity).unwrap();
            let p = transform.position;
            let distance = (p.x * p.x + p.z * p.z).sqrt();
            assert!(distance >= config.min_distance && distance <= config.max_distance);
            assert!(p.y >= config.min_height && p.y <= config.max_height);
            // Angle off the forward axis stays inside the half arc.
            assert!(p.x.atan2(p.z).abs() <= half_arc + 1e-4);
        }
    }

    #[test]
    fn spawned_balls_launch_upward() {
        let mut spawner = spawner();
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();

        let spawned = spawner.update(10.0, &mut world, &mut physics);
        for (entity, _) in spawned {
            let body = world.get::<&PhysicsBody>(entity).unwrap().rigid_body;
            let vel = physics.rigid_body_set[body].linvel();
            assert!(vel.y > 0.0);
        }
    }
}
