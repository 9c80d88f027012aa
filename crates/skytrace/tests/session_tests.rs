//! # Session Integration Tests
//!
//! Whole render ticks against the fake engine and recording renderer:
//! mode exclusivity, replay and drag end to end, commands, faults and
//! scene switching.

use std::io;

use skytrace::{
    BuiltScene, LoadError, SceneDescriptor, SceneKey, SceneMetadata, SceneSource, SessionConfig, SessionError,
    SimCommand, SimSession,
};
use skytrace_core::testing::MockEngine;
use skytrace_core::{
    BodyId, DragOutcome, EngineError, LayoutError, LightId, ModelTopology, PhysicsEngine, PhysicsState,
    PointerRay, SimMode,
};
use skytrace_render::testing::{RecordingRenderer, RenderCall};
use skytrace_render::{BatchId, InstanceBatches, NodeTable, SceneRenderer};
use skytrace_replay::{FrameOutcome, ReplayStatus, Trajectory, TrajectoryFrame};
use skytrace_shared::Vec3;

const BATCHES: InstanceBatches =
    InstanceBatches { spheres: BatchId(0), sphere_capacity: 64, cylinders: BatchId(1), cylinder_capacity: 64 };

/// Scene source backed by `MockEngine` constructors.
struct FakeSource {
    engine: fn() -> MockEngine,
    fail_fetch: bool,
    fail_build: bool,
    trajectory: Option<Trajectory>,
}

impl FakeSource {
    fn new(engine: fn() -> MockEngine) -> Self {
        Self { engine, fail_fetch: false, fail_build: false, trajectory: None }
    }

    fn drone() -> Self {
        Self::new(MockEngine::drone)
    }
}

fn metadata() -> SceneMetadata {
    SceneMetadata { obstacle_count: 5, start_position: [0.0, 0.0, 1.0], goal_position: [3.0, 0.0, 1.0] }
}

fn missing(key: &SceneKey) -> LoadError {
    LoadError::Io { path: key.scene_path(), source: io::Error::new(io::ErrorKind::NotFound, "missing") }
}

impl SceneSource for FakeSource {
    type Engine = MockEngine;

    fn fetch_scene(&mut self, key: &SceneKey) -> Result<SceneDescriptor, LoadError> {
        if self.fail_fetch {
            return Err(missing(key));
        }
        Ok(SceneDescriptor { key: key.clone(), model: "<mujoco/>".into(), metadata: metadata() })
    }

    fn build_scene(
        &mut self,
        descriptor: &SceneDescriptor,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<BuiltScene<MockEngine>, LoadError> {
        let engine = (self.engine)();
        let mut nodes = NodeTable::new();
        for body in 1..engine.topology().nbody() {
            nodes.bind_body(BodyId(body), renderer.create_node());
        }
        for light in 0..engine.topology().nlight {
            nodes.bind_light(LightId(light), renderer.create_node());
        }
        if self.fail_build {
            nodes.teardown(renderer);
            return Err(LoadError::Build { scene: descriptor.key.to_string(), reason: "bad mesh".into() });
        }
        Ok(BuiltScene { engine, nodes, batches: Some(BATCHES), metadata: descriptor.metadata.clone() })
    }

    fn fetch_trajectory(&mut self, key: &SceneKey) -> Result<Trajectory, LoadError> {
        self.trajectory.clone().ok_or_else(|| missing(key))
    }
}

type Session = SimSession<MockEngine, RecordingRenderer>;

fn key() -> SceneKey {
    SceneKey::new("quadrotor", 5)
}

fn session_with(source: &mut FakeSource) -> Session {
    let mut session = Session::new(RecordingRenderer::new(), &SessionConfig::default());
    session.load_scene(source, &key()).unwrap();
    session
}

fn drone_session() -> Session {
    session_with(&mut FakeSource::drone())
}

/// Frames at `(i * 0.1, 0, 0)`.
fn line(frames: usize) -> Trajectory {
    (0..frames).map(|i| TrajectoryFrame::at(Vec3::new(i as f64 * 0.1, 0.0, 0.0))).collect()
}

fn engine(session: &Session) -> &MockEngine {
    session.engine().unwrap()
}

fn chassis_position(session: &Session) -> Vec3 {
    Vec3::from_slice_at(&engine(session).state().qpos, 0).unwrap()
}

fn ray_from(x: f64) -> PointerRay {
    PointerRay::new(Vec3::new(x, 1.0, 5.0), Vec3::new(0.0, 0.0, -1.0))
}

// =============================================================================
// Replay
// =============================================================================

#[test]
fn test_full_replay_returns_to_live() {
    let mut session = drone_session();
    session.set_replay_speed(1);
    session.set_trajectory(line(25));
    session.run_replay().unwrap();
    assert_eq!(session.mode(), SimMode::Replaying);

    for tick in 0..24_u32 {
        let report = session.tick(f64::from(tick) * 16.0).unwrap();
        assert_eq!(report.mode, SimMode::Replaying, "left replay early on tick {tick}");
    }
    let report = session.tick(24.0 * 16.0).unwrap();
    assert!(report.replay.unwrap().completed);
    assert_eq!(report.mode, SimMode::Live);

    assert_eq!(session.replay_status(), &ReplayStatus::Completed { steps: 25 });
    assert_eq!(session.replay_status().to_string(), "Simulation completed - 25 steps");
    assert_eq!(session.markers().len(), 3);
    assert!(chassis_position(&session).distance(Vec3::new(2.4, 0.0, 0.0)) < 1e-12);
    assert_eq!(engine(&session).step_calls(), 0);

    // The chassis node shows the last frame, in rendering space.
    let node = session.nodes().unwrap().body_node(BodyId(1)).unwrap();
    let (position, _) = session.renderer().node_transform(node).unwrap();
    assert!(position.distance(Vec3::new(2.4, 0.0, 0.0)) < 1e-12);
}

#[test]
fn test_stepper_suppressed_while_replaying() {
    let mut session = drone_session();
    session.set_trajectory(line(30));
    session.tick(0.0).unwrap();
    session.run_replay().unwrap();

    // Default divisor 3: nine ticks, three frames, no integration.
    for tick in 1..=9_u32 {
        let report = session.tick(f64::from(tick) * 10.0).unwrap();
        assert_eq!(report.substeps, 0);
    }
    assert_eq!(engine(&session).step_calls(), 0);
    assert_eq!(session.player().cursor().frame(), 3);
    assert_eq!(engine(&session).forward_calls(), 3);
}

#[test]
fn test_live_ticks_never_advance_replay() {
    let mut session = drone_session();
    session.set_trajectory(line(30));

    for tick in 0..=5_u32 {
        let report = session.tick(f64::from(tick) * 10.0).unwrap();
        assert_eq!(report.replay, None);
    }
    assert_eq!(session.player().cursor().frame(), 0);
    assert_eq!(engine(&session).step_calls(), 25);
    assert_eq!(session.replay_status(), &ReplayStatus::Idle);
}

#[test]
fn test_stop_freezes_replay_and_resumes_live() {
    let mut session = drone_session();
    session.set_replay_speed(1);
    session.set_trajectory(line(25));
    session.set_paused(true).unwrap();
    session.run_replay().unwrap();

    for tick in 0..12_u32 {
        session.tick(f64::from(tick) * 16.0).unwrap();
    }
    assert_eq!(session.player().cursor().frame(), 12);
    assert_eq!(session.markers().len(), 2);
    let frozen = chassis_position(&session);

    assert!(session.command_sender().send(SimCommand::StopReplay));
    let report = session.tick(12.0 * 16.0).unwrap();
    assert_eq!(report.mode, SimMode::Live);
    assert_eq!(report.replay, None);
    assert_eq!(session.replay_status(), &ReplayStatus::Stopped);

    for tick in 13..20_u32 {
        session.tick(f64::from(tick) * 16.0).unwrap();
    }
    assert_eq!(session.player().cursor().frame(), 12);
    assert_eq!(session.markers().len(), 2);
    assert_eq!(session.renderer().live_marker_count(), 2);
    // Live physics resumed from the frozen pose; nothing pushes the mock.
    assert_eq!(chassis_position(&session), frozen);
}

#[test]
fn test_replay_rejections() {
    let mut session = Session::new(RecordingRenderer::new(), &SessionConfig::default());
    session.set_trajectory(line(5));
    assert!(matches!(session.run_replay(), Err(SessionError::NoScene)));

    let mut session = drone_session();
    assert!(matches!(session.run_replay(), Err(SessionError::NoTrajectory)));
    assert_eq!(session.replay_status().to_string(), "Error: no trajectory data loaded");
    assert_eq!(session.mode(), SimMode::Live);

    session.set_trajectory(line(5));
    session.run_replay().unwrap();
    assert!(matches!(session.run_replay(), Err(SessionError::ReplayAlreadyRunning)));
    assert!(matches!(session.set_paused(false), Err(SessionError::ModeLocked)));
    assert_eq!(session.mode(), SimMode::Replaying);
}

#[test]
fn test_trajectory_reload_stops_replay() {
    let mut source = FakeSource::drone();
    source.trajectory = Some(line(40));
    let mut session = session_with(&mut source);

    session.set_trajectory(line(5));
    session.run_replay().unwrap();
    assert_eq!(session.load_trajectory(&mut source, &key()).unwrap(), 40);
    assert_eq!(session.mode(), SimMode::Live);
    assert!(!session.player().is_running());

    source.trajectory = None;
    let err = session.load_trajectory(&mut source, &key()).unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::Io { .. })));
    assert_eq!(session.player().trajectory().map(Trajectory::len), Some(40));
}

// =============================================================================
// Drag
// =============================================================================

#[test]
fn test_paused_drag_one_tick() {
    let mut session = drone_session();
    session.set_paused(true).unwrap();

    // Chassis at physics (0, 0, 1), rendering (0, 1, 0).
    assert!(session.pointer_down(BodyId(1), Vec3::new(0.0, 1.0, 0.0), ray_from(0.0)));
    session.pointer_move(ray_from(1.0));

    let report = session.tick(16.0).unwrap();
    assert_eq!(report.drag, Some(DragOutcome::Applied));
    assert_eq!(report.substeps, 0);
    assert_eq!(&engine(&session).state().qpos[0..3], &[0.3, 0.0, 1.0]);
    assert_eq!(engine(&session).forward_calls(), 1);
    assert_eq!(engine(&session).step_calls(), 0);
}

#[test]
fn test_live_drag_pulls_chassis() {
    let mut session = drone_session();
    session.tick(0.0).unwrap();
    assert!(session.pointer_down(BodyId(1), Vec3::new(0.0, 1.0, 0.0), ray_from(0.0)));
    session.pointer_move(ray_from(1.0));

    let report = session.tick(10.0).unwrap();
    assert_eq!(report.substeps, 5);
    assert_eq!(engine(&session).applied_forces().len(), 5);
    assert!(chassis_position(&session).x > 0.0);

    assert_eq!(session.pointer_up(), Some(BodyId(1)));
    session.tick(20.0).unwrap();
    assert_eq!(engine(&session).applied_forces().len(), 5);
}

#[test]
fn test_pointer_inert_while_replaying() {
    let mut session = drone_session();
    assert!(session.pointer_down(BodyId(1), Vec3::new(0.0, 1.0, 0.0), ray_from(0.0)));

    session.set_trajectory(line(5));
    session.run_replay().unwrap();
    assert!(!session.interaction().is_dragging());
    assert!(!session.pointer_down(BodyId(1), Vec3::new(0.0, 1.0, 0.0), ray_from(0.0)));
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn test_commands_drained_at_tick_start() {
    let mut session = drone_session();
    let sender = session.command_sender();
    assert!(sender.send(SimCommand::SetReplaySpeed(2)));
    assert!(sender.send(SimCommand::SetNoise { correlation_time: 0.05, std_dev: 0.2 }));
    assert!(sender.send(SimCommand::SetPaused(true)));

    let report = session.tick(0.0).unwrap();
    assert_eq!(report.mode, SimMode::Paused);
    assert_eq!(report.rejected_commands, 0);
    assert_eq!(session.player().config().speed_divisor, 2);
    assert_eq!(session.noise().std_dev(), 0.2);
    assert_eq!(session.noise().correlation_time(), 0.05);
}

#[test]
fn test_rejected_commands_counted() {
    let mut session = drone_session();
    let sender = session.command_sender();
    assert!(sender.send(SimCommand::RunReplay));
    let report = session.tick(0.0).unwrap();
    assert_eq!(report.rejected_commands, 1);
    assert_eq!(report.mode, SimMode::Live);

    session.set_trajectory(line(5));
    assert!(sender.send(SimCommand::RunReplay));
    assert!(sender.send(SimCommand::SetPaused(true)));
    let report = session.tick(16.0).unwrap();
    assert_eq!(report.rejected_commands, 1);
    assert_eq!(report.mode, SimMode::Replaying);
}

#[test]
fn test_invalid_noise_params_rejected() {
    let mut session = drone_session();
    session.set_noise_params(0.05, 0.2).unwrap();

    for (tau, sigma) in [(0.05, f64::INFINITY), (f64::NAN, 0.2), (0.05, -1.0), (-0.1, 0.2)] {
        let err = session.set_noise_params(tau, sigma).unwrap_err();
        assert!(matches!(err, SessionError::InvalidNoise { .. }));
    }
    assert_eq!(session.noise().std_dev(), 0.2);
    assert_eq!(session.noise().correlation_time(), 0.05);

    // Same check on the command path.
    let sender = session.command_sender();
    assert!(sender.send(SimCommand::SetNoise { correlation_time: 0.05, std_dev: f64::INFINITY }));
    let report = session.tick(0.0).unwrap();
    assert_eq!(report.rejected_commands, 1);
    assert_eq!(session.noise().std_dev(), 0.2);
    assert!(session.engine().unwrap().state().ctrl.iter().all(|c| c.is_finite()));
}

// =============================================================================
// Phase ordering
// =============================================================================

#[test]
fn test_sync_precedes_draw() {
    let mut session = drone_session();
    session.renderer_mut().clear_calls();
    let report = session.tick(0.0).unwrap();

    // Three bodies and one light.
    assert_eq!(report.sync.bodies_synced, 3);
    assert_eq!(report.sync.lights_synced, 1);
    assert_eq!(session.renderer().last_frame_dirty(), 4);

    let calls = session.renderer().calls();
    assert_eq!(calls.last(), Some(&RenderCall::RenderFrame));
    assert_eq!(calls.iter().filter(|c| **c == RenderCall::RenderFrame).count(), 1);
}

#[test]
fn test_tick_without_scene_still_draws() {
    let mut session = Session::new(RecordingRenderer::new(), &SessionConfig::default());
    let report = session.tick(0.0).unwrap();
    assert_eq!(report.sync.bodies_synced, 0);
    assert_eq!(session.renderer().frames_rendered(), 1);
}

// =============================================================================
// Faults
// =============================================================================

fn failing_drone() -> MockEngine {
    let mut engine = MockEngine::drone();
    engine.fail_on("step");
    engine
}

#[test]
fn test_engine_fault_halts_physics_not_drawing() {
    let mut source = FakeSource::new(failing_drone);
    let mut session = session_with(&mut source);

    // First tick only syncs the clock.
    session.tick(0.0).unwrap();
    let err = session.tick(10.0).unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::CallFailed { call: "step", .. })));
    assert!(session.fault().is_some());
    assert_eq!(session.renderer().frames_rendered(), 2);

    let report = session.tick(20.0).unwrap();
    assert!(report.faulted);
    assert_eq!(report.substeps, 0);
    assert_eq!(session.renderer().frames_rendered(), 3);
    assert!(!session.pointer_down(BodyId(1), Vec3::new(0.0, 1.0, 0.0), ray_from(0.0)));

    // A reload clears the fault.
    source.engine = MockEngine::drone;
    session.load_scene(&mut source, &key()).unwrap();
    assert!(session.fault().is_none());
    session.tick(30.0).unwrap();
}

// =============================================================================
// Scene lifecycle
// =============================================================================

#[test]
fn test_failed_fetch_keeps_scene() {
    let mut source = FakeSource::drone();
    let mut session = session_with(&mut source);
    let nodes_before = session.renderer().live_node_count();

    source.fail_fetch = true;
    let err = session.load_scene(&mut source, &SceneKey::new("quadrotor", 9)).unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::Io { .. })));

    assert_eq!(session.scene_key(), Some(&key()));
    assert_eq!(session.renderer().live_node_count(), nodes_before);
    session.tick(0.0).unwrap();
}

#[test]
fn test_failed_build_leaves_no_scene() {
    let mut source = FakeSource::drone();
    let mut session = session_with(&mut source);

    source.fail_build = true;
    let err = session.load_scene(&mut source, &key()).unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::Build { .. })));
    assert!(!session.has_scene());
    assert_eq!(session.renderer().live_node_count(), 0);
}

fn broken_tables() -> MockEngine {
    let topology = ModelTopology {
        timestep: 0.002,
        body_mass: vec![0.0, 1.0],
        body_jntadr: vec![-1, 3],
        body_rootid: vec![0, 1],
        body_mocapid: vec![-1, -1],
        ..ModelTopology::default()
    };
    let state = PhysicsState {
        xpos: vec![0.0; 6],
        xquat: vec![1.0, 0.0, 0.0, 0.0].repeat(2),
        ..PhysicsState::default()
    };
    MockEngine::new(topology, state)
}

#[test]
fn test_inconsistent_tables_rejected_without_dangling_nodes() {
    let mut session = Session::new(RecordingRenderer::new(), &SessionConfig::default());
    let err = session.load_scene(&mut FakeSource::new(broken_tables), &key()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Load(LoadError::Layout(LayoutError::JointOutOfRange { body: 1, joint: 3, njnt: 0 }))
    ));
    assert!(!session.has_scene());
    assert_eq!(session.renderer().live_node_count(), 0);
}

#[test]
fn test_scene_switch_tears_down_everything() {
    let mut source = FakeSource::drone();
    let mut session = session_with(&mut source);
    let old_nodes: Vec<_> = session.nodes().unwrap().bodies().map(|(_, n)| n).collect();

    session.set_replay_speed(1);
    session.set_trajectory(line(25));
    session.run_replay().unwrap();
    for tick in 0..11_u32 {
        session.tick(f64::from(tick) * 16.0).unwrap();
    }
    assert_eq!(session.markers().len(), 2);
    assert_eq!(session.renderer().live_node_count(), 4 + 2);

    session.load_scene(&mut source, &SceneKey::new("quadrotor", 7)).unwrap();
    assert_eq!(session.mode(), SimMode::Live);
    assert_eq!(session.renderer().live_node_count(), 4);
    assert_eq!(session.renderer().live_marker_count(), 0);
    assert!(session.markers().is_empty());
    assert!(session.player().trajectory().is_none());
    assert_eq!(session.sim_time_ms(), 0.0);
    assert!(old_nodes.iter().all(|n| !session.renderer().is_live(*n)));
    assert_eq!(session.scene_metadata(), Some(&metadata()));
}

#[test]
fn test_pause_survives_scene_switch() {
    let mut source = FakeSource::drone();
    let mut session = session_with(&mut source);
    session.set_paused(true).unwrap();

    session.load_scene(&mut source, &SceneKey::new("quadrotor", 7)).unwrap();
    assert_eq!(session.mode(), SimMode::Paused);
    let report = session.tick(100.0).unwrap();
    assert_eq!(report.mode, SimMode::Paused);
    assert_eq!(report.substeps, 0);
    assert_eq!(engine(&session).step_calls(), 0);
}

#[test]
fn test_missing_chassis_replay_still_completes() {
    let mut session = session_with(&mut FakeSource::new(MockEngine::static_scene));
    session.set_replay_speed(1);
    session.set_trajectory(line(3));
    session.run_replay().unwrap();

    let mut outcomes = Vec::new();
    for tick in 0..3_u32 {
        outcomes.push(session.tick(f64::from(tick)).unwrap().replay.unwrap().frame);
    }
    assert_eq!(
        outcomes,
        vec![
            FrameOutcome::ChassisMissing { index: 0 },
            FrameOutcome::ChassisMissing { index: 1 },
            FrameOutcome::ChassisMissing { index: 2 },
        ]
    );
    assert_eq!(session.mode(), SimMode::Live);
    assert!(session.markers().is_empty());
}
