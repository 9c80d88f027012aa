//! # SKYTRACE Shared
//!
//! Common types used by the physics stepper, the pose sync and the replay
//! player.
//!
//! ## CRITICAL RULE
//!
//! Physics space is Z-up, rendering space is Y-up. Values cross that boundary
//! only through [`coords`]. A hand-rolled swizzle anywhere else is a bug
//! waiting to desync visuals from physics.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod constants;
pub mod coords;
pub mod math;

pub use coords::{physics_to_render, physics_to_render_quat, render_to_physics, render_to_physics_quat};
pub use math::{InstanceTransform, Quaternion, Vec3};
