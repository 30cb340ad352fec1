//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use engine_core::{Transform, Vec3};
use glam::Quat;
use rapier3d::na;
use rapier3d::parry::query::PointQuery;
use rapier3d::prelude::*;
use std::sync::Mutex;

/// Collects collision (and sensor intersection) events raised during a
/// single pipeline step.
#[derive(Default)]
struct CollisionEventQueue {
    events: Mutex<Vec<CollisionEvent>>,
}

impl EventHandler for CollisionEventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Step the physics simulation and return the collision events it
    /// raised, in the order Rapier reported them.
    pub fn step(&mut self) -> Vec<CollisionEvent> {
        let events = CollisionEventQueue::default();
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &events,
        );
        events.events.into_inner().unwrap_or_default()
    }

    /// Add a dynamic ball body with an initial velocity and spin. Collision
    /// events are enabled so ground contacts are reported.
    pub fn add_dynamic_ball(
        &mut self,
        position: Vec3,
        linvel: Vec3,
        angvel: Vec3,
        radius: f32,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .linvel(vector![linvel.x, linvel.y, linvel.z])
            .angvel(vector![angvel.x, angvel.y, angvel.z])
            .build();
        let body_handle = self.rigid_body_set.insert(rigid_body);

        let (membership, filter) = CollisionGroup::ball();
        let collider = ColliderBuilder::ball(radius)
            .restitution(0.4)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .collision_groups(InteractionGroups::new(membership, filter))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        (body_handle, collider_handle)
    }

    /// Add a kinematic rigid body (the tracked blade).
    pub fn add_kinematic_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position.x, position.y, position.z])
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add the blade's cuboid sensor volume to a rigid body. Sensor
    /// intersections with balls raise enter/exit collision events.
    pub fn add_blade_sensor(
        &mut self,
        body_handle: RigidBodyHandle,
        half_extents: Vec3,
    ) -> ColliderHandle {
        let (membership, filter) = CollisionGroup::blade();
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .collision_groups(InteractionGroups::new(membership, filter))
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a ground plane collider (flat Y=0 half-space).
    pub fn add_ground_plane(&mut self) -> ColliderHandle {
        let (membership, filter) = CollisionGroup::environment();
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(InteractionGroups::new(membership, filter))
            .build();
        self.collider_set.insert(collider)
    }

    /// Move a kinematic body to a new pose for the next step.
    pub fn set_kinematic_pose(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_next_kinematic_translation(vector![position.x, position.y, position.z]);
            body.set_next_kinematic_rotation(na::UnitQuaternion::new_normalize(
                na::Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z),
            ));
        }
    }

    /// Enable or disable a body: a disabled body neither moves nor collides
    /// but keeps its handles valid until removal.
    pub fn set_body_enabled(&mut self, handle: RigidBodyHandle, enabled: bool) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_enabled(enabled);
        }
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// Get the world-space pose of a collider.
    pub fn collider_pose(&self, handle: ColliderHandle) -> Option<(Vec3, Quat)> {
        self.collider_set.get(handle).map(|collider| {
            let iso = collider.position();
            let t = iso.translation.vector;
            let r = iso.rotation;
            (
                Vec3::new(t.x, t.y, t.z),
                Quat::from_xyzw(r.i, r.j, r.k, r.w),
            )
        })
    }

    /// Project a world-space point onto a collider's volume. Points already
    /// inside the volume project onto themselves.
    pub fn closest_point_on_collider(&self, handle: ColliderHandle, point: Vec3) -> Option<Vec3> {
        match self.collider_set.get(handle) {
            Some(collider) => {
                let projection = collider.shape().project_point(
                    collider.position(),
                    &point![point.x, point.y, point.z],
                    true,
                );
                Some(Vec3::new(
                    projection.point.x,
                    projection.point.y,
                    projection.point.z,
                ))
            }
            None => {
                log::debug!("closest-point query against missing collider {:?}", handle);
                None
            }
        }
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}
