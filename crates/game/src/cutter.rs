//! Fast pass-through detection and cut-plane construction.
//!
//! The blade's sensor volume reports trigger enter/exit against balls; this
//! module tracks each engagement and, on a qualifying exit, reconstructs the
//! slice plane from the entry/exit midpoint and the flat of the blade.

use glam::{Quat, Vec3};
use hecs::Entity;
use physics::{ColliderHandle, PhysicsWorld};
use std::collections::HashMap;

/// A slice request dispatched to the ball the blade passed through.
/// Built on a qualifying exit and consumed immediately, never stored.
#[derive(Debug, Clone, Copy)]
pub struct CutEvent {
    /// A point on the cut plane (the entry/exit midpoint).
    pub plane_point: Vec3,
    /// Unit normal of the cut plane (the flat of the blade, in world space).
    pub plane_normal: Vec3,
    /// Blade velocity at the moment the cut registered.
    pub velocity: Vec3,
}

/// Detects fast passes through ball triggers and tells the target exactly
/// where the slice plane is.
pub struct BladeCutter {
    /// Minimum blade speed (units/s) required to register a slice.
    velocity_threshold: f32,
    /// Entry and exit closer than this cannot define a plane.
    min_separation: f32,
    /// Local axis of the blade representing the flat of the blade.
    blade_normal_local: Vec3,
    /// The blade's sensor collider, used for closest-point queries.
    collider: ColliderHandle,
    /// Blade velocity, fed from the kinematic estimator each fixed step.
    velocity: Vec3,
    /// Entry points for balls the blade is currently passing through.
    entries: HashMap<Entity, Vec3>,
}

impl BladeCutter {
    pub fn new(
        collider: ColliderHandle,
        velocity_threshold: f32,
        min_separation: f32,
        blade_normal_local: Vec3,
    ) -> Self {
        Self {
            velocity_threshold,
            min_separation,
            blade_normal_local,
            collider,
            velocity: Vec3::ZERO,
            entries: HashMap::new(),
        }
    }

    /// Feed the latest blade velocity estimate. Call once per fixed step.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// The blade began overlapping `target`. Slow touches are ignored;
    /// otherwise the closest point on the blade volume to the target center
    /// is recorded as the entry point.
    pub fn contact_begin(&mut self, target: Entity, target_center: Vec3, physics: &PhysicsWorld) {
        if self.velocity.length() < self.velocity_threshold {
            return;
        }
        if let Some(entry) = physics.closest_point_on_collider(self.collider, target_center) {
            log::debug!("blade entered {:?} at {:?}", target, entry);
            self.entries.insert(target, entry);
        }
    }

    /// The blade stopped overlapping `target`. Returns the cut to dispatch,
    /// or None when the pass did not qualify.
    pub fn contact_end(
        &mut self,
        target: Entity,
        target_center: Vec3,
        physics: &PhysicsWorld,
    ) -> Option<CutEvent> {
        let entry = self.entries.remove(&target)?;
        if self.velocity.length() < self.velocity_threshold {
            // Slowed down mid-pass: a graze, not a slice.
            return None;
        }
        let exit = physics.closest_point_on_collider(self.collider, target_center)?;
        let (_, blade_rotation) = physics.collider_pose(self.collider)?;
        self.build_cut(entry, exit, blade_rotation)
    }

    /// Drop any pending entry for a target that no longer exists.
    pub fn forget(&mut self, target: Entity) {
        self.entries.remove(&target);
    }

    fn build_cut(&self, entry: Vec3, exit: Vec3, blade_rotation: Quat) -> Option<CutEvent> {
        if entry.distance(exit) < self.min_separation {
            // Too short a pass to define a plane.
            return None;
        }
        let plane_point = (entry + exit) * 0.5;
        let plane_normal = (blade_rotation * self.blade_normal_local).try_normalize()?;
        Some(CutEvent {
            plane_point,
            plane_normal,
            velocity: self.velocity,
        })
    }
}
