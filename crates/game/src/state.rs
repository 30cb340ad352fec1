//! Top-level simulation state and wiring.

use engine_core::{Time, Vec3, World};
use hecs::Entity;
use physics::{ColliderHandle, PhysicsBody, PhysicsWorld, RigidBodyHandle};
use rand::prelude::*;
use std::collections::HashMap;

use crate::ball::{CapSplitter, CutTuning};
use crate::config::GameConfig;
use crate::cutter::BladeCutter;
use crate::kinematics::{BladeKinematics, BladePose};
use crate::session::Round;
use crate::spawner::BallSpawner;

/// The sword: a kinematic body with a sensor volume, plus the estimator and
/// cut detector that watch it.
pub struct BladeRig {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub kinematics: BladeKinematics,
    pub cutter: BladeCutter,
}

/// Everything the simulation owns. The host drives it with `update`.
pub struct GameState {
    pub world: World,
    pub physics: PhysicsWorld,
    pub time: Time,
    pub config: GameConfig,
    pub blade: BladeRig,
    pub spawner: BallSpawner,
    pub round: Round,
    pub tuning: CutTuning,
    pub splitter: CapSplitter,
    pub ground: ColliderHandle,
    /// Maps ball colliders back to their entities for event routing.
    pub collider_lookup: HashMap<ColliderHandle, Entity>,
    pub rng: StdRng,
}

impl GameState {
    /// Build a fresh simulation from config, seeding randomness from the OS.
    pub fn new(config: GameConfig) -> Self {
        Self::build(config, StdRng::from_entropy(), StdRng::from_entropy())
    }

    /// Build a deterministic simulation for tests and replays.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::build(
            config,
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn build(config: GameConfig, rng: StdRng, spawner_rng: StdRng) -> Self {
        let time = Time::new();
        let mut physics = PhysicsWorld::new();
        // Rapier integrates with its own dt; keep it locked to the logical
        // fixed step.
        physics.integration_parameters.dt = time.fixed_timestep_seconds();
        let ground = physics.add_ground_plane();

        let blade_body = physics.add_kinematic_body(Vec3::new(0.0, 1.2, 0.0));
        let blade_collider =
            physics.add_blade_sensor(blade_body, Vec3::from(config.blade_half_extents));
        let blade = BladeRig {
            body: blade_body,
            collider: blade_collider,
            kinematics: BladeKinematics::new(config.alpha),
            cutter: BladeCutter::new(
                blade_collider,
                config.velocity_threshold,
                config.min_cut_separation,
                Vec3::from(config.blade_normal_local),
            ),
        };

        let spawner = BallSpawner::from_config(&config, spawner_rng);
        let round = Round::new(config.round_duration);
        let tuning = CutTuning {
            impulse_factor: config.impulse_factor,
            piece_despawn_delay: config.piece_despawn_delay,
            removal_grace: config.removal_grace,
        };

        Self {
            world: World::new(),
            physics,
            time,
            config,
            blade,
            spawner,
            round,
            tuning,
            splitter: CapSplitter,
            ground,
            collider_lookup: HashMap::new(),
            rng,
        }
    }

    pub fn start_round(&mut self) {
        self.round.start();
    }

    /// Advance the simulation by one host frame, draining as many fixed
    /// steps as the frame covers. `pose` is the freshest controller pose.
    pub fn update(&mut self, dt: f32, pose: &BladePose) {
        self.time.advance(dt);
        let fixed_dt = self.time.fixed_timestep_seconds();
        while self.time.should_fixed_update() {
            crate::update::fixed_step(self, pose, fixed_dt);
        }
    }

    /// Remove an entity along with its physics body and routing entries.
    /// Safe on entities without a physics body (pieces).
    pub fn despawn_entity(&mut self, entity: Entity) {
        let handles = self
            .world
            .get::<&PhysicsBody>(entity)
            .ok()
            .map(|body| (body.rigid_body, body.collider));
        if let Some((body, collider)) = handles {
            self.physics.remove_body(body);
            self.collider_lookup.remove(&collider);
        }
        self.blade.cutter.forget(entity);
        self.world.despawn(entity).ok();
    }

    pub fn score(&self) -> u32 {
        self.round.score()
    }

    pub fn round_running(&self) -> bool {
        self.round.is_running()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.time.elapsed_seconds()
    }
}
