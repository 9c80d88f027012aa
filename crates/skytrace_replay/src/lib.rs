//! # SKYTRACE Replay
//!
//! Plays a recorded flight back through the physics engine, one frame per
//! N render ticks, dropping a breadcrumb every few frames.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cursor;
pub mod error;
pub mod player;
pub mod trajectory;

pub use cursor::ReplayCursor;
pub use error::{ReplayError, ReplayResult, TrajectoryError};
pub use player::{FrameOutcome, ReplayConfig, ReplayStatus, ReplayTick, TrajectoryPlayer};
pub use trajectory::{Trajectory, TrajectoryFrame};
