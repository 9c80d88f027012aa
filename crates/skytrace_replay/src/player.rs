//! # Trajectory Player
//!
//! ```text
//!          run                      last frame applied
//!   Idle ───────▶ Running ─────────────────────────────▶ Completed
//!    ▲              │                                        │
//!    │              │ stop                                   │
//!    │              ▼                                        │
//!    └──── run ── Stopped ◀──────────── run ─────────────────┘
//! ```
//!
//! Each non-throttled tick writes one frame into the chassis free joint and
//! re-derives kinematics with `forward`. Physics is never integrated here;
//! the caller keeps the stepper suppressed while a replay runs.

use std::fmt;

use skytrace_core::{EngineResult, PhysicsEngine, SceneLayout};
use skytrace_render::{MarkerTrail, NodeId, SceneRenderer};
use skytrace_shared::constants::{MARKER_INTERVAL, REPLAY_SPEED_DIVISOR};
use tracing::{debug, info, warn};

use crate::cursor::ReplayCursor;
use crate::error::{ReplayError, ReplayResult};
use crate::trajectory::Trajectory;

/// Playback tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Render ticks per frame advance.
    pub speed_divisor: u32,
    /// A breadcrumb marker is dropped on every frame index divisible by this.
    pub marker_interval: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { speed_divisor: REPLAY_SPEED_DIVISOR, marker_interval: MARKER_INTERVAL }
    }
}

/// Status line for the UI layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReplayStatus {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// Playing.
    Running {
        /// Recorded step of the last applied frame, or its index.
        step: u64,
        /// Last frame index.
        total: usize,
        /// Progress, 0 to 100.
        percent: f64,
    },
    /// Every frame was applied.
    Completed {
        /// Frames in the trajectory.
        steps: usize,
    },
    /// Stopped by command.
    Stopped,
    /// `run` was rejected.
    Failed {
        /// Why.
        reason: String,
    },
}

impl fmt::Display for ReplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Ready"),
            Self::Running { step, total, percent } => {
                write!(f, "Running: Step {step}/{total} ({percent:.1}%)")
            }
            Self::Completed { steps } => write!(f, "Simulation completed - {steps} steps"),
            Self::Stopped => f.write_str("Simulation stopped"),
            Self::Failed { reason } => write!(f, "Error: {reason}"),
        }
    }
}

/// What a replay tick did to the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not running.
    Idle,
    /// Speed throttle swallowed this tick.
    Throttled,
    /// Frame written; a marker was dropped if this index called for one.
    Applied {
        /// Frame index.
        index: usize,
        /// Marker dropped on this frame.
        marker: Option<NodeId>,
    },
    /// No free-jointed chassis in the scene; the frame was skipped.
    ChassisMissing {
        /// Frame index.
        index: usize,
    },
}

/// Result of one replay tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayTick {
    /// Effect on the current frame.
    pub frame: FrameOutcome,
    /// The replay finished on this tick.
    pub completed: bool,
}

impl ReplayTick {
    const fn only(frame: FrameOutcome) -> Self {
        Self { frame, completed: false }
    }
}

/// Replay state machine.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryPlayer {
    config: ReplayConfig,
    trajectory: Option<Trajectory>,
    cursor: ReplayCursor,
    markers: MarkerTrail,
    status: ReplayStatus,
}

impl TrajectoryPlayer {
    /// Creates an idle player with no trajectory.
    #[must_use]
    pub fn new(config: ReplayConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Installs a trajectory. A running replay is stopped first.
    pub fn load(&mut self, trajectory: Trajectory) {
        self.stop();
        info!(frames = trajectory.len(), "Trajectory loaded");
        self.trajectory = Some(trajectory);
        self.status = ReplayStatus::Idle;
    }

    /// Drops the trajectory. A running replay is stopped first.
    pub fn unload(&mut self) {
        self.stop();
        self.trajectory = None;
        self.status = ReplayStatus::Idle;
    }

    /// Loaded trajectory.
    #[must_use]
    pub const fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    /// Sets render ticks per frame advance; 0 is treated as 1.
    pub fn set_speed(&mut self, divisor: u32) {
        self.config.speed_divisor = divisor.max(1);
        debug!(divisor = self.config.speed_divisor, "Replay speed set");
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> ReplayConfig {
        self.config
    }

    /// Playback position.
    #[must_use]
    pub const fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    /// Breadcrumbs dropped by the current or last replay.
    #[must_use]
    pub const fn markers(&self) -> &MarkerTrail {
        &self.markers
    }

    /// Status line.
    #[must_use]
    pub const fn status(&self) -> &ReplayStatus {
        &self.status
    }

    /// Is a replay running?
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.cursor.is_running()
    }

    /// Starts from frame 0, clearing the previous replay's markers.
    ///
    /// # Errors
    ///
    /// Rejected when a replay is already running, or when no non-empty
    /// trajectory is loaded.
    pub fn run<R: SceneRenderer + ?Sized>(&mut self, renderer: &mut R) -> ReplayResult<()> {
        if self.cursor.is_running() {
            return Err(ReplayError::AlreadyRunning);
        }
        let Some(trajectory) = self.trajectory.as_ref().filter(|t| !t.is_empty()) else {
            let err = ReplayError::NoTrajectory;
            self.status = ReplayStatus::Failed { reason: err.to_string() };
            warn!("Replay requested with no trajectory loaded");
            return Err(err);
        };

        let frames = trajectory.len();
        self.markers.clear(renderer);
        self.cursor.start();
        self.status = ReplayStatus::Running { step: 0, total: frames - 1, percent: 0.0 };
        info!(frames, divisor = self.config.speed_divisor, "Replay started");
        Ok(())
    }

    /// Stops in place. Frame index and markers are left as they are.
    ///
    /// Returns whether a replay was running.
    pub fn stop(&mut self) -> bool {
        if !self.cursor.is_running() {
            return false;
        }
        self.cursor.halt();
        self.status = ReplayStatus::Stopped;
        info!(frame = self.cursor.frame(), "Replay stopped");
        true
    }

    /// Removes every marker from the renderer.
    pub fn clear_markers<R: SceneRenderer + ?Sized>(&mut self, renderer: &mut R) {
        self.markers.clear(renderer);
    }

    /// Advances playback by one render tick.
    ///
    /// # Errors
    ///
    /// Propagates a fault from the engine's `forward`.
    pub fn tick<E, R>(
        &mut self,
        engine: &mut E,
        layout: &SceneLayout,
        renderer: &mut R,
    ) -> EngineResult<ReplayTick>
    where
        E: PhysicsEngine,
        R: SceneRenderer + ?Sized,
    {
        if !self.cursor.is_running() {
            return Ok(ReplayTick::only(FrameOutcome::Idle));
        }
        if !self.cursor.throttle(self.config.speed_divisor) {
            return Ok(ReplayTick::only(FrameOutcome::Throttled));
        }

        let index = self.cursor.frame();
        let (frame, frames) = match self.trajectory.as_ref() {
            Some(t) => (t.frame(index).copied(), t.len()),
            None => (None, 0),
        };
        let Some(frame) = frame else {
            // Trajectory swapped out from under a running replay.
            self.finish(frames);
            return Ok(ReplayTick { frame: FrameOutcome::Idle, completed: true });
        };

        let outcome = match layout.chassis() {
            Some(chassis) => {
                let state = engine.state_mut();
                chassis.joint.set_translation(state, frame.position);
                if let Some(velocity) = frame.velocity {
                    chassis.joint.set_velocity(state, velocity);
                }
                engine.forward()?;

                let marker = (index % self.config.marker_interval.max(1) == 0)
                    .then(|| self.markers.push(renderer, frame.position));
                FrameOutcome::Applied { index, marker }
            }
            None => {
                warn!(index, "No free-jointed chassis in scene, frame skipped");
                FrameOutcome::ChassisMissing { index }
            }
        };

        self.status = ReplayStatus::Running {
            step: frame.step.unwrap_or_else(|| u64::try_from(index).unwrap_or(u64::MAX)),
            total: frames - 1,
            percent: progress(index, frames),
        };
        self.cursor.advance();

        let completed = self.cursor.frame() >= frames;
        if completed {
            self.finish(frames);
        }
        Ok(ReplayTick { frame: outcome, completed })
    }

    fn finish(&mut self, frames: usize) {
        self.cursor.halt();
        self.status = ReplayStatus::Completed { steps: frames };
        info!(frames, markers = self.markers.len(), "Replay completed");
    }
}

#[allow(clippy::cast_precision_loss)]
fn progress(index: usize, frames: usize) -> f64 {
    index as f64 / frames as f64 * 100.0
}
