//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for the few families of objects in the arena.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (the ground plane)
    Environment = 1 << 0,
    /// The blade's sensor volume
    Blade = 1 << 1,
    /// Thrown balls
    Ball = 1 << 2,
}

impl CollisionGroup {
    /// Create a collision group for environment.
    pub fn environment() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Environment as u32);
        let filter = Group::ALL;
        (membership, filter)
    }

    /// Create a collision group for the blade sensor. It only needs to see
    /// balls; the environment never triggers it.
    pub fn blade() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Blade as u32);
        let filter = Group::from_bits_retain(Self::Ball as u32);
        (membership, filter)
    }

    /// Create a collision group for thrown balls.
    pub fn ball() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Ball as u32);
        let filter = Group::from_bits_retain(
            Self::Environment as u32 | Self::Blade as u32 | Self::Ball as u32,
        );
        (membership, filter)
    }
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

impl PhysicsBody {
    pub fn new(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider,
        }
    }
}
