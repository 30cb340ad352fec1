//! Core simulation types for the slicing minigame.
//!
//! This crate provides the foundational types used across the simulation:
//! - Transform and spatial components
//! - Logical time with a fixed-step accumulator
//! - Common component types for ECS

pub mod components;
pub mod time;
pub mod transform;

pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec3};
pub use hecs::{Entity, World};
