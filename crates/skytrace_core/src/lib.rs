//! # SKYTRACE Core
//!
//! The simulation half of the render tick. Owns nothing of the engine's
//! internals; it drives the engine through [`PhysicsEngine`] and touches
//! packed state only through the typed views in [`layout`].
//!
//! ## Modules
//!
//! - [`engine`]: the engine seam and its packed state
//! - [`layout`]: `BodyRef` / `JointRef` / `SceneLayout`, resolved once per scene
//! - [`stepper`]: fixed-step accumulator with catch-up clamp
//! - [`noise`]: Ornstein–Uhlenbeck control noise
//! - [`interaction`]: pointer drag to force / pose offset
//! - [`mode`]: `Live | Paused | Replaying`

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod mode;
pub mod noise;
pub mod stepper;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use engine::{BodyId, JointId, JointKind, LightId, ModelTopology, PhysicsEngine, PhysicsState};
pub use error::{EngineError, EngineResult, LayoutError, LayoutResult};
pub use interaction::{DragOutcome, DragSession, InteractionController, InteractionGains, PointerRay};
pub use layout::{BodyRef, ChassisRef, JointRef, SceneLayout};
pub use mode::SimMode;
pub use noise::ControlNoise;
pub use stepper::{PhysicsStepper, StepReport, StepStats};
