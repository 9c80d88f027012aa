//! # Physics Stepper
//!
//! Fixed-step accumulator nested in a variable-rate render tick.
//!
//! ```text
//! render tick (t_render)
//!   │
//!   ├─ t_render - t_sim > max catch-up?  ──▶ t_sim = t_render (drop the backlog)
//!   │
//!   └─ while t_sim < t_render:
//!        1. control noise
//!        2. clear applied forces, re-apply drag force
//!        3. engine.step()
//!        4. t_sim += dt
//! ```
//!
//! After the clamp `t_sim` never runs more than one `dt` ahead of `t_render`,
//! and the number of steps per tick is bounded by `max_catch_up / dt + 1`.

use skytrace_shared::constants::MAX_CATCH_UP_MS;
use tracing::debug;

use crate::engine::PhysicsEngine;
use crate::error::{EngineError, EngineResult};
use crate::interaction::InteractionController;
use crate::layout::SceneLayout;
use crate::noise::ControlNoise;

/// What one `advance` did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Integration calls made.
    pub substeps: u32,
    /// The backlog exceeded the catch-up window and was dropped.
    pub clamped: bool,
}

/// Running totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Integration calls since the last reset.
    pub total_substeps: u64,
    /// Ticks on which the catch-up clamp engaged.
    pub clamp_count: u64,
    /// Integration calls on the most recent tick.
    pub last_substeps: u32,
}

/// Drives the engine on a fixed timestep from render timestamps.
#[derive(Clone, Debug)]
pub struct PhysicsStepper {
    sim_time_ms: f64,
    max_catch_up_ms: f64,
    stats: StepStats,
}

impl PhysicsStepper {
    /// Creates a stepper with the given catch-up window.
    #[must_use]
    pub const fn new(max_catch_up_ms: f64) -> Self {
        Self {
            sim_time_ms: 0.0,
            max_catch_up_ms,
            stats: StepStats { total_substeps: 0, clamp_count: 0, last_substeps: 0 },
        }
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub const fn sim_time_ms(&self) -> f64 {
        self.sim_time_ms
    }

    /// Catch-up window in milliseconds.
    #[must_use]
    pub const fn max_catch_up_ms(&self) -> f64 {
        self.max_catch_up_ms
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> StepStats {
        self.stats
    }

    /// Rewinds simulated time for a freshly loaded scene.
    pub fn reset(&mut self) {
        self.sim_time_ms = 0.0;
        self.stats = StepStats::default();
    }

    /// Advances the engine until simulated time reaches `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestep can't drive the accumulator or any
    /// engine call faults. Simulated time keeps the sub-steps that completed.
    pub fn advance<E: PhysicsEngine>(
        &mut self,
        engine: &mut E,
        layout: &SceneLayout,
        now_ms: f64,
        noise: &mut ControlNoise,
        drag: &mut InteractionController,
    ) -> EngineResult<StepReport> {
        let dt = engine.timestep();
        if !dt.is_finite() || dt <= 0.0 {
            return Err(EngineError::InvalidTimestep(dt));
        }
        let dt_ms = dt * 1000.0;

        let mut report = StepReport::default();
        let backlog = now_ms - self.sim_time_ms;
        if backlog > self.max_catch_up_ms {
            debug!(backlog_ms = backlog, "Catch-up clamp engaged");
            self.sim_time_ms = now_ms;
            report.clamped = true;
            self.stats.clamp_count += 1;
        }

        while self.sim_time_ms < now_ms {
            noise.perturb(&mut engine.state_mut().ctrl, dt);
            engine.state_mut().clear_applied_forces();
            drag.apply_running(engine, layout)?;
            engine.step()?;

            self.sim_time_ms += dt_ms;
            report.substeps += 1;
            self.stats.total_substeps += 1;
        }

        self.stats.last_substeps = report.substeps;
        Ok(report)
    }
}

impl Default for PhysicsStepper {
    fn default() -> Self {
        Self::new(MAX_CATCH_UP_MS)
    }
}
