//! Recording fake of the physics engine.
//!
//! Enabled by the `testing` feature. The fake integrates free-joint
//! translation with explicit Euler and derives body poses from joint
//! coordinates, which is enough to watch the stepper, drag and replay paths
//! move things around.

use skytrace_shared::Vec3;

use crate::engine::{BodyId, JointKind, ModelTopology, PhysicsEngine, PhysicsState};
use crate::error::{EngineError, EngineResult};

/// One recorded `apply_force_torque` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedForce {
    /// Force, physics space.
    pub force: Vec3,
    /// Torque, physics space.
    pub torque: Vec3,
    /// Application point, physics space.
    pub point: Vec3,
    /// Target body.
    pub body: BodyId,
}

/// Scriptable engine double.
#[derive(Clone, Debug)]
pub struct MockEngine {
    topology: ModelTopology,
    state: PhysicsState,
    /// Fixed offset of each joint-less body from its root, physics space.
    body_offsets: Vec<Vec3>,
    step_calls: usize,
    forward_calls: usize,
    applied: Vec<AppliedForce>,
    fail_on: Option<&'static str>,
}

impl MockEngine {
    /// Wraps arbitrary tables. Body offsets default to zero.
    #[must_use]
    pub fn new(topology: ModelTopology, state: PhysicsState) -> Self {
        let body_offsets = vec![Vec3::ZERO; topology.nbody()];
        Self {
            topology,
            state,
            body_offsets,
            step_calls: 0,
            forward_calls: 0,
            applied: Vec::new(),
            fail_on: None,
        }
    }

    /// A quadrotor scene.
    ///
    /// | body | role | joint | root | mocap |
    /// |---|---|---|---|---|
    /// | 0 | world | - | 0 | - |
    /// | 1 | chassis, 1.5 kg, starts at (0, 0, 1) | free (qpos 0..7) | 1 | - |
    /// | 2 | rotor, 0.1 above the chassis | - | 1 | - |
    /// | 3 | goal marker | - | 3 | slot 0 |
    ///
    /// Plus four actuators, one light, one tendon with three wrap points and
    /// one flex with two vertices. Timestep 2 ms.
    #[must_use]
    pub fn drone() -> Self {
        let topology = ModelTopology {
            timestep: 0.002,
            body_mass: vec![0.0, 1.5, 0.1, 0.0],
            body_jntadr: vec![-1, 0, -1, -1],
            body_rootid: vec![0, 1, 1, 3],
            body_mocapid: vec![-1, -1, -1, 0],
            jnt_type: vec![JointKind::Free],
            jnt_qposadr: vec![0],
            jnt_dofadr: vec![0],
            nlight: 1,
            tendon_width: vec![0.005],
            flex_vertadr: vec![0],
            flex_vertnum: vec![2],
        };
        let state = PhysicsState {
            qpos: vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            qvel: vec![0.0; JointKind::Free.dof_width()],
            ctrl: vec![0.0; 4],
            qfrc_applied: vec![0.0; JointKind::Free.dof_width()],
            mocap_pos: vec![3.0, 0.0, 1.0],
            xpos: vec![0.0; 12],
            xquat: vec![1.0, 0.0, 0.0, 0.0].repeat(4),
            light_xpos: vec![0.0, 0.0, 5.0],
            light_xdir: vec![0.0, 0.0, -1.0],
            ten_wrapadr: vec![0],
            ten_wrapnum: vec![3],
            wrap_xpos: vec![0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 2.0],
            flexvert_xpos: vec![0.5, 0.5, 0.5, -0.5, -0.5, 0.5],
        };
        let mut engine = Self::new(topology, state);
        engine.body_offsets[2] = Vec3::new(0.0, 0.0, 0.1);
        engine.derive_poses();
        engine
    }

    /// World plus one jointless, non-mocap body: nothing can be dragged or
    /// replayed.
    #[must_use]
    pub fn static_scene() -> Self {
        let topology = ModelTopology {
            timestep: 0.002,
            body_mass: vec![0.0, 1.0],
            body_jntadr: vec![-1, -1],
            body_rootid: vec![0, 1],
            body_mocapid: vec![-1, -1],
            ..ModelTopology::default()
        };
        let state = PhysicsState {
            xpos: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            xquat: vec![1.0, 0.0, 0.0, 0.0].repeat(2),
            ..PhysicsState::default()
        };
        Self::new(topology, state)
    }

    /// Makes every later call to `call` fail.
    pub fn fail_on(&mut self, call: &'static str) {
        self.fail_on = Some(call);
    }

    /// Number of `step` calls.
    #[must_use]
    pub const fn step_calls(&self) -> usize {
        self.step_calls
    }

    /// Number of `forward` calls.
    #[must_use]
    pub const fn forward_calls(&self) -> usize {
        self.forward_calls
    }

    /// Every `apply_force_torque` call, in order.
    #[must_use]
    pub fn applied_forces(&self) -> &[AppliedForce] {
        &self.applied
    }

    fn check(&self, call: &'static str) -> EngineResult<()> {
        if self.fail_on == Some(call) {
            return Err(EngineError::CallFailed { call, reason: "injected fault".into() });
        }
        Ok(())
    }

    fn free_joint_of(&self, body: usize) -> Option<(usize, usize)> {
        let adr = usize::try_from(*self.topology.body_jntadr.get(body)?).ok()?;
        if *self.topology.jnt_type.get(adr)? != JointKind::Free {
            return None;
        }
        Some((*self.topology.jnt_qposadr.get(adr)?, *self.topology.jnt_dofadr.get(adr)?))
    }

    /// Bodies are visited in index order, so a root is posed before its
    /// children.
    fn derive_poses(&mut self) {
        for body in 1..self.topology.nbody() {
            let mocap = self.topology.body_mocapid.get(body).and_then(|&m| usize::try_from(m).ok());
            let root = self.topology.body_rootid.get(body).copied().unwrap_or(body);

            let (position, orientation) = if let Some(slot) = mocap {
                let Some(p) = Vec3::from_slice_at(&self.state.mocap_pos, slot * 3) else { continue };
                (p, [1.0, 0.0, 0.0, 0.0])
            } else if let Some((qpos, _)) = self.free_joint_of(body) {
                let Some(q) = self.state.qpos.get(qpos..qpos + 7) else { continue };
                (Vec3::new(q[0], q[1], q[2]), [q[3], q[4], q[5], q[6]])
            } else if root != body {
                let Some(p) = Vec3::from_slice_at(&self.state.xpos, root * 3) else { continue };
                let Some(q) = self.state.xquat.get(root * 4..root * 4 + 4) else { continue };
                (p + self.body_offsets[body], [q[0], q[1], q[2], q[3]])
            } else {
                continue;
            };

            if let Some(slot) = self.state.xpos.get_mut(body * 3..body * 3 + 3) {
                slot.copy_from_slice(&position.to_array());
            }
            if let Some(slot) = self.state.xquat.get_mut(body * 4..body * 4 + 4) {
                slot.copy_from_slice(&orientation);
            }
        }
    }
}

impl PhysicsEngine for MockEngine {
    fn topology(&self) -> &ModelTopology {
        &self.topology
    }

    fn state(&self) -> &PhysicsState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PhysicsState {
        &mut self.state
    }

    fn step(&mut self) -> EngineResult<()> {
        self.check("step")?;
        self.step_calls += 1;

        let dt = self.topology.timestep;
        for body in 1..self.topology.nbody() {
            let Some((qpos, dof)) = self.free_joint_of(body) else { continue };
            let mass = self.topology.body_mass[body].max(f64::EPSILON);
            for axis in 0..3 {
                let accel = self.state.qfrc_applied.get(dof + axis).copied().unwrap_or(0.0) / mass;
                if let Some(v) = self.state.qvel.get_mut(dof + axis) {
                    *v += accel * dt;
                    let v = *v;
                    if let Some(p) = self.state.qpos.get_mut(qpos + axis) {
                        *p += v * dt;
                    }
                }
            }
        }
        self.derive_poses();
        Ok(())
    }

    fn forward(&mut self) -> EngineResult<()> {
        self.check("forward")?;
        self.forward_calls += 1;
        self.derive_poses();
        Ok(())
    }

    fn apply_force_torque(
        &mut self,
        force: Vec3,
        torque: Vec3,
        point: Vec3,
        body: BodyId,
    ) -> EngineResult<()> {
        self.check("apply_force_torque")?;
        self.applied.push(AppliedForce { force, torque, point, body });

        let root = self.topology.body_rootid.get(body.0).copied().unwrap_or(body.0);
        if let Some((_, dof)) = self.free_joint_of(root) {
            if let Some(slot) = self.state.qfrc_applied.get_mut(dof..dof + 3) {
                for (f, add) in slot.iter_mut().zip(force.to_array()) {
                    *f += add;
                }
            }
        }
        Ok(())
    }
}
