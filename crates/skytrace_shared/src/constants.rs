//! # Simulation Constants
//!
//! Defaults shared by the stepper, interaction and replay crates. Every one of
//! these can be overridden from the session configuration file.

/// Largest wall-clock gap (milliseconds) the stepper will try to catch up in
/// one render tick. Beyond this the simulated clock snaps to the render clock.
pub const MAX_CATCH_UP_MS: f64 = 35.0;

/// Gain applied to `(currentWorld - worldHit) * mass` while running.
pub const DRAG_FORCE_GAIN: f64 = 250.0;

/// Fraction of the drag offset written straight into position while paused.
pub const PAUSED_DRAG_GAIN: f64 = 0.3;

/// Render ticks per replayed trajectory frame.
pub const REPLAY_SPEED_DIVISOR: u32 = 3;

/// A breadcrumb marker is dropped every this many replayed frames.
pub const MARKER_INTERVAL: usize = 10;

/// Radius of the sphere drawn at each soft-body vertex.
pub const FLEX_VERTEX_RADIUS: f64 = 0.01;

/// Wrap points closer than this to the origin are treated as unset.
pub const WRAP_VALID_EPSILON: f64 = 0.01;
