//! # Core Error Types
//!
//! Failures that cross the physics engine seam or surface while binding a
//! freshly loaded model. Recoverable conditions (missing chassis, drag on a
//! body without a rootable joint) are outcome enums, not errors.

use thiserror::Error;

/// A physics engine call faulted.
///
/// Fatal to the current scene: physics and render state may disagree after
/// this, so the session stops mutating until a scene is reloaded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine reported a failure from one of its entry points.
    #[error("engine call `{call}` failed: {reason}")]
    CallFailed {
        /// Entry point that failed (`step`, `forward`, `apply_force_torque`).
        call: &'static str,
        /// Engine-provided description.
        reason: String,
    },

    /// The model's integration timestep cannot drive an accumulator.
    #[error("invalid integration timestep: {0}")]
    InvalidTimestep(f64),
}

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// The engine's address tables are inconsistent with its state arrays.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A per-body or per-joint table has the wrong length.
    #[error("model table `{table}` has {actual} entries, expected {expected}")]
    TableLength {
        /// Table name.
        table: &'static str,
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        actual: usize,
    },

    /// A body points at a joint the model doesn't have.
    #[error("body {body} references joint {joint}, but the model has {njnt} joints")]
    JointOutOfRange {
        /// Offending body.
        body: usize,
        /// Joint address read from `body_jntadr`.
        joint: i32,
        /// Number of joints in the model.
        njnt: usize,
    },

    /// A body's kinematic root is not a body.
    #[error("body {body} has root {root}, but the model has {nbody} bodies")]
    RootOutOfRange {
        /// Offending body.
        body: usize,
        /// Root read from `body_rootid`.
        root: usize,
        /// Number of bodies in the model.
        nbody: usize,
    },

    /// A body's mocap slot lies outside `mocap_pos`.
    #[error("body {body} references mocap slot {mocap}, but only {available} are allocated")]
    MocapOutOfRange {
        /// Offending body.
        body: usize,
        /// Mocap id read from `body_mocapid`.
        mocap: i32,
        /// Number of mocap slots in state.
        available: usize,
    },

    /// A free joint's coordinates run past the end of a state array.
    #[error("joint {joint} needs `{array}[{start}..{end}]`, but the array has length {len}")]
    AddressOutOfRange {
        /// Offending joint.
        joint: usize,
        /// State array name (`qpos` or `qvel`).
        array: &'static str,
        /// First coordinate.
        start: usize,
        /// One past the last coordinate.
        end: usize,
        /// Array length.
        len: usize,
    },

    /// The model's integration timestep is zero, negative or not finite.
    #[error("invalid integration timestep: {0}")]
    InvalidTimestep(f64),
}

/// Result type for layout construction.
pub type LayoutResult<T> = Result<T, LayoutError>;
