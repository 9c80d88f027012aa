//! # Simulation Session
//!
//! Owns one loaded scene and everything that mutates it. The host calls
//! [`SimSession::tick`] once per animation frame:
//!
//! ```text
//! tick(now_ms)
//!   │
//!   ├─ 1. input      drain queued commands
//!   ├─ 2. physics    Live      → stepper (noise, drag force, step) × n
//!   │                Paused    → drag pose offset, forward
//!   │                Replaying → trajectory player (write frame, forward)
//!   ├─ 3. pose sync  physics state → scene graph
//!   └─ 4. draw       render_frame
//! ```
//!
//! Exactly one path in phase 2 runs per tick, selected by [`SimMode`].
//!
//! ## Faults
//!
//! An [`EngineError`] from any engine call faults the scene: physics and
//! pose sync stop until the next `load_scene`, but phase 4 still runs so the
//! last valid frame stays on screen.

use skytrace_core::{
    BodyId, ControlNoise, DragOutcome, EngineError, EngineResult, InteractionController, PhysicsEngine,
    PhysicsStepper, PointerRay, SceneLayout, SimMode, StepStats,
};
use skytrace_render::{InstanceBatches, MarkerTrail, NodeTable, PoseSync, SceneRenderer, SyncStats};
use skytrace_replay::{ReplayStatus, ReplayTick, Trajectory, TrajectoryPlayer};
use skytrace_shared::Vec3;
use tracing::{debug, error, info, warn};

use crate::commands::{CommandQueue, CommandSender, SimCommand, COMMAND_CAPACITY};
use crate::config::SessionConfig;
use crate::error::{LoadError, SessionError, SessionResult};
use crate::scene::{BuiltScene, SceneKey, SceneMetadata, SceneSource};

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Mode at the end of the tick.
    pub mode: SimMode,
    /// Integration sub-steps (Live only).
    pub substeps: u32,
    /// The stepper's catch-up clamp engaged.
    pub clamped: bool,
    /// Paused drag result (Paused only).
    pub drag: Option<DragOutcome>,
    /// Replay result (Replaying only).
    pub replay: Option<ReplayTick>,
    /// Pose sync counts. Zero when nothing was synced.
    pub sync: SyncStats,
    /// The scene is faulted; only the draw call ran.
    pub faulted: bool,
    /// Queued commands that were rejected.
    pub rejected_commands: u32,
}

struct ActiveScene<E> {
    key: SceneKey,
    engine: E,
    layout: SceneLayout,
    nodes: NodeTable,
    batches: Option<InstanceBatches>,
    metadata: SceneMetadata,
    fault: Option<EngineError>,
}

/// Render-tick orchestrator for one scene at a time.
pub struct SimSession<E, R> {
    renderer: R,
    scene: Option<ActiveScene<E>>,
    mode: SimMode,
    stepper: PhysicsStepper,
    noise: ControlNoise,
    drag: InteractionController,
    player: TrajectoryPlayer,
    sync: PoseSync,
    commands: CommandQueue,
}

impl<E: PhysicsEngine, R: SceneRenderer> SimSession<E, R> {
    /// Creates a session with no scene.
    #[must_use]
    pub fn new(renderer: R, config: &SessionConfig) -> Self {
        Self {
            renderer,
            scene: None,
            mode: SimMode::Live,
            stepper: PhysicsStepper::new(config.stepper.max_catch_up_ms),
            noise: config.noise(),
            drag: InteractionController::new(config.gains()),
            player: TrajectoryPlayer::new(config.replay_config()),
            sync: PoseSync::new(config.sync_config()),
            commands: CommandQueue::new(COMMAND_CAPACITY),
        }
    }

    /// A handle for queueing commands from the UI layer.
    #[must_use]
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    // =========================================================================
    // Scene lifecycle
    // =========================================================================

    /// Replaces the current scene with `key`.
    ///
    /// The current scene survives a failed fetch. Once the fetch succeeds it
    /// is torn down, so a later failure leaves the session with no scene.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if any step fails.
    pub fn load_scene<S>(&mut self, source: &mut S, key: &SceneKey) -> SessionResult<()>
    where
        S: SceneSource<Engine = E>,
    {
        let descriptor = source.fetch_scene(key)?;
        self.unload_scene();

        let BuiltScene { engine, mut nodes, batches, metadata } =
            source.build_scene(&descriptor, &mut self.renderer)?;
        let layout = match SceneLayout::build(engine.topology(), engine.state()) {
            Ok(layout) => layout,
            Err(err) => {
                nodes.teardown(&mut self.renderer);
                warn!(scene = %key, %err, "Scene rejected");
                return Err(LoadError::from(err).into());
            }
        };

        info!(
            scene = %key,
            bodies = layout.bodies().len(),
            lights = layout.light_count(),
            actuators = layout.actuator_count(),
            chassis = layout.chassis().is_some(),
            "Scene loaded: {metadata}"
        );
        self.scene = Some(ActiveScene {
            key: key.clone(),
            engine,
            layout,
            nodes,
            batches,
            metadata,
            fault: None,
        });
        Ok(())
    }

    /// Tears down the current scene, its markers and any replay state.
    ///
    /// Leaves no nodes behind in the renderer. A paused session stays paused;
    /// an interrupted replay goes back to live.
    pub fn unload_scene(&mut self) {
        self.player.unload();
        self.player.clear_markers(&mut self.renderer);
        self.drag.release();
        self.stepper.reset();
        if self.mode == SimMode::Replaying {
            switch_mode(&mut self.mode, SimMode::Live);
        }

        if let Some(mut scene) = self.scene.take() {
            scene.nodes.teardown(&mut self.renderer);
            info!(scene = %scene.key, "Scene unloaded");
        }
    }

    /// Fetches and installs the recorded trajectory for `key`.
    ///
    /// A running replay is stopped first. Returns the frame count.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if the fetch fails; the previous
    /// trajectory stays loaded.
    pub fn load_trajectory<S: SceneSource>(&mut self, source: &mut S, key: &SceneKey) -> SessionResult<usize> {
        let trajectory = source.fetch_trajectory(key)?;
        Ok(self.set_trajectory(trajectory))
    }

    /// Installs a trajectory directly. Returns the frame count.
    pub fn set_trajectory(&mut self, trajectory: Trajectory) -> usize {
        let frames = trajectory.len();
        self.player.load(trajectory);
        if self.mode == SimMode::Replaying {
            switch_mode(&mut self.mode, SimMode::Live);
        }
        frames
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Starts replaying the loaded trajectory from frame 0.
    ///
    /// Live physics is suspended and any drag released until the replay
    /// stops or completes.
    ///
    /// # Errors
    ///
    /// Rejected with no scene, with no (non-empty) trajectory, or while a
    /// replay is already running.
    pub fn run_replay(&mut self) -> SessionResult<()> {
        if self.scene.is_none() {
            return Err(SessionError::NoScene);
        }
        self.player.run(&mut self.renderer)?;
        self.drag.release();
        switch_mode(&mut self.mode, SimMode::Replaying);
        Ok(())
    }

    /// Stops replay in place and resumes live physics.
    ///
    /// Returns whether a replay was running.
    pub fn stop_replay(&mut self) -> bool {
        let was_running = self.player.stop();
        switch_mode(&mut self.mode, SimMode::Live);
        was_running
    }

    /// Render ticks per replayed frame; 0 is treated as 1.
    pub fn set_replay_speed(&mut self, divisor: u32) {
        self.player.set_speed(divisor);
    }

    /// Pauses or resumes live physics.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ModeLocked`] while replaying.
    pub fn set_paused(&mut self, paused: bool) -> SessionResult<()> {
        if self.mode == SimMode::Replaying {
            return Err(SessionError::ModeLocked);
        }
        let next = if paused { SimMode::Paused } else { SimMode::Live };
        switch_mode(&mut self.mode, next);
        Ok(())
    }

    /// Control noise correlation time (seconds) and standard deviation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidNoise`] unless both are finite and
    /// non-negative. The current parameters are kept.
    pub fn set_noise_params(&mut self, correlation_time: f64, std_dev: f64) -> SessionResult<()> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(correlation_time) || !valid(std_dev) {
            return Err(SessionError::InvalidNoise { correlation_time, std_dev });
        }
        self.noise.set_params(correlation_time, std_dev);
        debug!(correlation_time, std_dev, "Noise parameters set");
        Ok(())
    }

    fn apply_command(&mut self, command: SimCommand) -> SessionResult<()> {
        match command {
            SimCommand::RunReplay => self.run_replay(),
            SimCommand::StopReplay => {
                self.stop_replay();
                Ok(())
            }
            SimCommand::SetReplaySpeed(divisor) => {
                self.set_replay_speed(divisor);
                Ok(())
            }
            SimCommand::SetPaused(paused) => self.set_paused(paused),
            SimCommand::SetNoise { correlation_time, std_dev } => self.set_noise_params(correlation_time, std_dev),
        }
    }

    fn drain_commands(&mut self) -> u32 {
        let mut rejected = 0;
        for command in self.commands.drain() {
            if let Err(err) = self.apply_command(command) {
                warn!(?command, %err, "Command rejected");
                rejected += 1;
            }
        }
        rejected
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    /// Grabs `body` at rendering-space point `hit` under `ray`.
    ///
    /// Returns `false` if nothing was grabbed: no scene, a faulted scene,
    /// replay running, or a body that can't be dragged.
    pub fn pointer_down(&mut self, body: BodyId, hit: Vec3, ray: PointerRay) -> bool {
        if !self.mode.accepts_drag() {
            return false;
        }
        match self.scene.as_ref() {
            Some(scene) if scene.fault.is_none() => self.drag.grab(scene.engine.state(), body, hit, ray),
            _ => false,
        }
    }

    /// Feeds the latest pointer ray to the active drag.
    pub fn pointer_move(&mut self, ray: PointerRay) {
        self.drag.move_pointer(ray);
    }

    /// Releases the active drag.
    pub fn pointer_up(&mut self) -> Option<BodyId> {
        self.drag.release()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Runs one render tick at wall-clock time `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Engine`] on the tick an engine call faults.
    /// The frame is still drawn. Later ticks only draw until a scene is
    /// reloaded.
    pub fn tick(&mut self, now_ms: f64) -> SessionResult<TickReport> {
        let mut report = TickReport { rejected_commands: self.drain_commands(), ..TickReport::default() };

        let Some(scene) = self.scene.as_mut() else {
            report.mode = self.mode;
            self.renderer.render_frame();
            return Ok(report);
        };
        if scene.fault.is_some() {
            report.mode = self.mode;
            report.faulted = true;
            self.renderer.render_frame();
            return Ok(report);
        }

        let physics: EngineResult<()> = match self.mode {
            SimMode::Live => self
                .stepper
                .advance(&mut scene.engine, &scene.layout, now_ms, &mut self.noise, &mut self.drag)
                .map(|step| {
                    report.substeps = step.substeps;
                    report.clamped = step.clamped;
                }),
            SimMode::Paused => {
                report.drag = Some(self.drag.apply_paused(scene.engine.state_mut(), &scene.layout));
                scene.engine.forward()
            }
            SimMode::Replaying => self
                .player
                .tick(&mut scene.engine, &scene.layout, &mut self.renderer)
                .map(|replay| report.replay = Some(replay)),
        };

        if let Err(err) = physics {
            error!(scene = %scene.key, %err, "Engine fault, physics halted until reload");
            scene.fault = Some(err.clone());
            if self.player.stop() {
                switch_mode(&mut self.mode, SimMode::Live);
            }
            self.drag.release();
            self.renderer.render_frame();
            return Err(err.into());
        }

        if self.mode == SimMode::Replaying && !self.player.is_running() {
            switch_mode(&mut self.mode, SimMode::Live);
        }

        report.sync = self.sync.sync(
            scene.engine.topology(),
            scene.engine.state(),
            &scene.nodes,
            scene.batches.as_ref(),
            &mut self.renderer,
        );
        self.renderer.render_frame();

        report.mode = self.mode;
        Ok(report)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> SimMode {
        self.mode
    }

    /// The renderer.
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Is a scene loaded?
    #[must_use]
    pub const fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// Key of the loaded scene.
    #[must_use]
    pub fn scene_key(&self) -> Option<&SceneKey> {
        self.scene.as_ref().map(|s| &s.key)
    }

    /// Metadata of the loaded scene.
    #[must_use]
    pub fn scene_metadata(&self) -> Option<&SceneMetadata> {
        self.scene.as_ref().map(|s| &s.metadata)
    }

    /// The loaded engine.
    #[must_use]
    pub fn engine(&self) -> Option<&E> {
        self.scene.as_ref().map(|s| &s.engine)
    }

    /// The loaded scene's typed accessors.
    #[must_use]
    pub fn layout(&self) -> Option<&SceneLayout> {
        self.scene.as_ref().map(|s| &s.layout)
    }

    /// The loaded scene's node bindings.
    #[must_use]
    pub fn nodes(&self) -> Option<&NodeTable> {
        self.scene.as_ref().map(|s| &s.nodes)
    }

    /// The fault that halted physics, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&EngineError> {
        self.scene.as_ref().and_then(|s| s.fault.as_ref())
    }

    /// Replay status line.
    #[must_use]
    pub const fn replay_status(&self) -> &ReplayStatus {
        self.player.status()
    }

    /// The trajectory player.
    #[must_use]
    pub const fn player(&self) -> &TrajectoryPlayer {
        &self.player
    }

    /// Replay breadcrumbs.
    #[must_use]
    pub const fn markers(&self) -> &MarkerTrail {
        self.player.markers()
    }

    /// The drag controller.
    #[must_use]
    pub const fn interaction(&self) -> &InteractionController {
        &self.drag
    }

    /// Stepper totals since the scene loaded.
    #[must_use]
    pub const fn step_stats(&self) -> StepStats {
        self.stepper.stats()
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub const fn sim_time_ms(&self) -> f64 {
        self.stepper.sim_time_ms()
    }

    /// The control noise source.
    #[must_use]
    pub const fn noise(&self) -> &ControlNoise {
        &self.noise
    }

    /// Pose sync counts from the last synced tick.
    #[must_use]
    pub const fn sync_stats(&self) -> SyncStats {
        self.sync.stats()
    }
}

fn switch_mode(mode: &mut SimMode, next: SimMode) {
    if *mode != next {
        info!(from = %mode, to = %next, "Mode changed");
        *mode = next;
    }
}
