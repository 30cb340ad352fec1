//! Fixed-step update pipeline.
//!
//! One call advances everything that happens inside a single simulation
//! tick, in a fixed order: round clock and spawning, blade estimation,
//! physics, contact routing and cuts, ball bookkeeping, piece integration,
//! lifetime sweep. Everything runs on the caller's thread.

use engine_core::{Lifetime, Transform, Vec3};
use hecs::Entity;
use physics::{ColliderHandle, CollisionEvent, PhysicsBody};

use crate::ball::{self, ThrownBall};
use crate::kinematics::BladePose;
use crate::state::GameState;

/// Run one fixed step of `dt` seconds.
pub fn fixed_step(state: &mut GameState, pose: &BladePose, dt: f32) {
    // Round clock; spawning stops the moment the round ends.
    state.round.update(dt);
    if state.round.is_running() {
        let spawned = state
            .spawner
            .update(dt, &mut state.world, &mut state.physics);
        for (entity, collider) in spawned {
            state.collider_lookup.insert(collider, entity);
        }
    }

    // Estimate blade motion, then move the kinematic body to the new pose.
    let kinematic = *state.blade.kinematics.sample(pose, dt);
    state.blade.cutter.set_velocity(kinematic.linear_velocity);
    state
        .physics
        .set_kinematic_pose(state.blade.body, pose.position, pose.rotation);

    // Physics step. Events are routed afterwards so every query below sees
    // post-step collider poses.
    let events = state.physics.step();
    route_events(state, &events);

    sync_ball_transforms(state);
    tick_ground_timers(state, dt);
    cull_out_of_bounds(state);
    ball::update_pieces(&mut state.world, dt);
    sweep_lifetimes(state, dt);
}

/// Dispatch trigger and contact events to the cutter and the ground-timer
/// logic.
fn route_events(state: &mut GameState, events: &[CollisionEvent]) {
    for event in events {
        match *event {
            CollisionEvent::Started(a, b, _) => {
                if let Some((entity, center)) = blade_contact(state, a, b) {
                    state
                        .blade
                        .cutter
                        .contact_begin(entity, center, &state.physics);
                } else if let Some(entity) = ground_contact(state, a, b) {
                    let delay = state.config.ground_despawn_delay;
                    if let Ok(thrown) = state.world.query_one_mut::<&mut ThrownBall>(entity) {
                        ball::arm_ground_despawn(thrown, delay);
                    }
                }
            }
            CollisionEvent::Stopped(a, b, _) => {
                if let Some((entity, center)) = blade_contact(state, a, b) {
                    let cut = state
                        .blade
                        .cutter
                        .contact_end(entity, center, &state.physics);
                    if let Some(cut) = cut {
                        ball::apply_cut(
                            &mut state.world,
                            &mut state.physics,
                            entity,
                            &cut,
                            &state.tuning,
                            &state.splitter,
                            &mut state.round,
                            &mut state.rng,
                        );
                    }
                }
            }
        }
    }
}

/// If the event pairs the blade sensor with a known ball, return the ball
/// and its current center. Events against colliders that vanished this
/// step resolve to None.
fn blade_contact(
    state: &GameState,
    a: ColliderHandle,
    b: ColliderHandle,
) -> Option<(Entity, Vec3)> {
    let blade = state.blade.collider;
    let other = if a == blade {
        b
    } else if b == blade {
        a
    } else {
        return None;
    };
    let entity = *state.collider_lookup.get(&other)?;
    let (center, _) = state.physics.collider_pose(other)?;
    Some((entity, center))
}

/// If the event pairs the ground with a known ball, return the ball.
fn ground_contact(state: &GameState, a: ColliderHandle, b: ColliderHandle) -> Option<Entity> {
    let ground = state.ground;
    let other = if a == ground {
        b
    } else if b == ground {
        a
    } else {
        return None;
    };
    state.collider_lookup.get(&other).copied()
}

/// Copy post-step body poses onto un-cut balls. Cut originals are frozen
/// and keep their last pose until removal.
fn sync_ball_transforms(state: &mut GameState) {
    let physics = &state.physics;
    for (_, (transform, body, ball)) in state
        .world
        .query_mut::<(&mut Transform, &PhysicsBody, &ThrownBall)>()
    {
        if ball.has_been_cut {
            continue;
        }
        if let Some(t) = physics.get_body_transform(body.rigid_body) {
            transform.position = t.position;
            transform.rotation = t.rotation;
        }
    }
}

/// Tick armed ground-despawn timers; a ball that was cut in the meantime is
/// left to the cut's own removal path.
fn tick_ground_timers(state: &mut GameState, dt: f32) {
    let mut expired = Vec::new();
    for (entity, ball) in state.world.query_mut::<&mut ThrownBall>() {
        if let Some(remaining) = ball.ground_despawn.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 && !ball.has_been_cut {
                expired.push(entity);
            }
        }
    }
    for entity in expired {
        log::debug!("ball {:?} despawned on the ground", entity);
        state.despawn_entity(entity);
    }
}

/// Destroy balls that left the playfield, whatever their state.
fn cull_out_of_bounds(state: &mut GameState) {
    let floor = state.config.floor_kill_y;
    let mut gone = Vec::new();
    for (entity, (transform, _)) in state.world.query_mut::<(&Transform, &ThrownBall)>() {
        if transform.position.y < floor {
            gone.push(entity);
        }
    }
    for entity in gone {
        log::debug!("ball {:?} fell out of bounds", entity);
        state.despawn_entity(entity);
    }
}

/// Tick lifetimes (pieces and cut originals) and despawn the expired.
fn sweep_lifetimes(state: &mut GameState, dt: f32) {
    let mut expired = Vec::new();
    for (entity, lifetime) in state.world.query_mut::<&mut Lifetime>() {
        if lifetime.update(dt) {
            expired.push(entity);
        }
    }
    for entity in expired {
        state.despawn_entity(entity);
    }
}
