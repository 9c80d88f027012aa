//! # Physics Engine Seam
//!
//! The engine is an external collaborator: it owns the model, integrates it,
//! and recomputes derived kinematics. SKYTRACE only steps it, forwards it,
//! applies perturbation forces through it, and reads or writes its packed
//! state arrays.
//!
//! ```text
//! ┌───────────────────┐  step / forward / apply_force_torque  ┌──────────────┐
//! │  PhysicsStepper   │ ─────────────────────────────────────▶│              │
//! │  TrajectoryPlayer │                                        │ PhysicsEngine│
//! │  Interaction      │ ◀──── topology() / state() ─────────── │              │
//! └───────────────────┘                                        └──────────────┘
//! ```
//!
//! Raw tables follow the engine's conventions: `-1` means "none", positions
//! are packed `xyz` triples and quaternions packed scalar-first `wxyz`. Nothing
//! outside `layout` should index these arrays by hand.

use skytrace_shared::{Quaternion, Vec3};

use crate::error::EngineResult;

/// Index of a body in the loaded model. Body 0 is the static world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

impl BodyId {
    /// The static world body.
    pub const WORLD: Self = Self(0);
}

/// Index of a joint in the loaded model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub usize);

/// Index of a light in the loaded model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub usize);

/// Joint types, numbered as the engine numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointKind {
    /// 6-DOF unconstrained: 7 position coordinates, 6 velocity coordinates.
    Free,
    /// 3-DOF rotation.
    Ball,
    /// 1-DOF translation.
    Slide,
    /// 1-DOF rotation.
    Hinge,
}

impl JointKind {
    /// Decodes the engine's integer joint type.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Free),
            1 => Some(Self::Ball),
            2 => Some(Self::Slide),
            3 => Some(Self::Hinge),
            _ => None,
        }
    }

    /// Number of position coordinates.
    #[must_use]
    pub const fn qpos_width(self) -> usize {
        match self {
            Self::Free => 7,
            Self::Ball => 4,
            Self::Slide | Self::Hinge => 1,
        }
    }

    /// Number of velocity coordinates.
    #[must_use]
    pub const fn dof_width(self) -> usize {
        match self {
            Self::Free => 6,
            Self::Ball => 3,
            Self::Slide | Self::Hinge => 1,
        }
    }
}

/// Immutable model tables, fixed for the lifetime of a loaded scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelTopology {
    /// Fixed integration timestep in seconds.
    pub timestep: f64,
    /// Mass per body.
    pub body_mass: Vec<f64>,
    /// First joint of each body, `-1` if the body has none.
    pub body_jntadr: Vec<i32>,
    /// Kinematic root body of each body.
    pub body_rootid: Vec<usize>,
    /// Mocap slot of each body, `-1` if the body isn't mocap-driven.
    pub body_mocapid: Vec<i32>,
    /// Joint type per joint.
    pub jnt_type: Vec<JointKind>,
    /// First `qpos` coordinate of each joint.
    pub jnt_qposadr: Vec<usize>,
    /// First `qvel` coordinate of each joint.
    pub jnt_dofadr: Vec<usize>,
    /// Number of lights.
    pub nlight: usize,
    /// Visual radius per tendon.
    pub tendon_width: Vec<f64>,
    /// First vertex of each flex.
    pub flex_vertadr: Vec<usize>,
    /// Vertex count of each flex.
    pub flex_vertnum: Vec<usize>,
}

impl ModelTopology {
    /// Number of bodies, including the world body.
    #[must_use]
    pub fn nbody(&self) -> usize {
        self.body_mass.len()
    }

    /// Number of joints.
    #[must_use]
    pub fn njnt(&self) -> usize {
        self.jnt_type.len()
    }
}

/// Mutable packed state, owned by the engine.
///
/// Array lengths never change while a model is loaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicsState {
    /// Joint position coordinates.
    pub qpos: Vec<f64>,
    /// Joint velocity coordinates.
    pub qvel: Vec<f64>,
    /// Actuator controls.
    pub ctrl: Vec<f64>,
    /// Externally applied generalized forces, one per DOF.
    pub qfrc_applied: Vec<f64>,
    /// Mocap body positions, `xyz` per slot.
    pub mocap_pos: Vec<f64>,
    /// Body world positions, `xyz` per body.
    pub xpos: Vec<f64>,
    /// Body world orientations, `wxyz` per body.
    pub xquat: Vec<f64>,
    /// Light world positions, `xyz` per light.
    pub light_xpos: Vec<f64>,
    /// Light world directions, `xyz` per light.
    pub light_xdir: Vec<f64>,
    /// First wrap point of each tendon.
    pub ten_wrapadr: Vec<usize>,
    /// Wrap point count of each tendon.
    pub ten_wrapnum: Vec<usize>,
    /// Tendon wrap points, `xyz` per point.
    pub wrap_xpos: Vec<f64>,
    /// Flex vertex positions, `xyz` per vertex.
    pub flexvert_xpos: Vec<f64>,
}

impl PhysicsState {
    /// World position of a body.
    #[must_use]
    pub fn body_position(&self, body: BodyId) -> Option<Vec3> {
        Vec3::from_slice_at(&self.xpos, body.0 * 3)
    }

    /// World orientation of a body.
    #[must_use]
    pub fn body_orientation(&self, body: BodyId) -> Option<Quaternion> {
        Quaternion::from_wxyz_slice_at(&self.xquat, body.0 * 4)
    }

    /// World position of a light.
    #[must_use]
    pub fn light_position(&self, light: LightId) -> Option<Vec3> {
        Vec3::from_slice_at(&self.light_xpos, light.0 * 3)
    }

    /// World direction of a light.
    #[must_use]
    pub fn light_direction(&self, light: LightId) -> Option<Vec3> {
        Vec3::from_slice_at(&self.light_xdir, light.0 * 3)
    }

    /// A tendon wrap point by global wrap index.
    #[must_use]
    pub fn wrap_point(&self, wrap: usize) -> Option<Vec3> {
        Vec3::from_slice_at(&self.wrap_xpos, wrap * 3)
    }

    /// A flex vertex by global vertex index.
    #[must_use]
    pub fn flex_vertex(&self, vertex: usize) -> Option<Vec3> {
        Vec3::from_slice_at(&self.flexvert_xpos, vertex * 3)
    }

    /// Zeroes every externally applied generalized force.
    pub fn clear_applied_forces(&mut self) {
        self.qfrc_applied.fill(0.0);
    }
}

/// The external physics engine, as SKYTRACE consumes it.
///
/// Implementations wrap a loaded model plus its state. All calls are
/// synchronous and run on the render-tick thread.
pub trait PhysicsEngine {
    /// Model tables.
    fn topology(&self) -> &ModelTopology;

    /// Current state.
    fn state(&self) -> &PhysicsState;

    /// Current state, for direct edits (replay injection, paused drag).
    fn state_mut(&mut self) -> &mut PhysicsState;

    /// Integrates one fixed timestep.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine faults; the scene must be reloaded.
    fn step(&mut self) -> EngineResult<()>;

    /// Recomputes derived kinematics from the current coordinates without
    /// advancing time.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine faults; the scene must be reloaded.
    fn forward(&mut self) -> EngineResult<()>;

    /// Converts a force and torque acting at a world point on `body` into
    /// generalized forces and accumulates them into `qfrc_applied`.
    ///
    /// All arguments are in physics coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine faults; the scene must be reloaded.
    fn apply_force_torque(
        &mut self,
        force: Vec3,
        torque: Vec3,
        point: Vec3,
        body: BodyId,
    ) -> EngineResult<()>;

    /// Fixed integration timestep in seconds.
    fn timestep(&self) -> f64 {
        self.topology().timestep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_kind_decoding() {
        assert_eq!(JointKind::from_raw(0), Some(JointKind::Free));
        assert_eq!(JointKind::from_raw(3), Some(JointKind::Hinge));
        assert_eq!(JointKind::from_raw(7), None);
        assert_eq!(JointKind::Free.qpos_width(), 7);
        assert_eq!(JointKind::Free.dof_width(), 6);
    }

    #[test]
    fn test_state_reads_are_bounds_checked() {
        let state = PhysicsState {
            xpos: vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0],
            xquat: vec![1.0, 0.0, 0.0, 0.0],
            ..PhysicsState::default()
        };
        assert_eq!(state.body_position(BodyId(1)), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(state.body_position(BodyId(2)), None);
        assert_eq!(state.body_orientation(BodyId::WORLD), Some(Quaternion::IDENTITY));
        assert_eq!(state.body_orientation(BodyId(1)), None);
    }

    #[test]
    fn test_clear_applied_forces() {
        let mut state = PhysicsState { qfrc_applied: vec![1.0, -2.0, 3.0], ..PhysicsState::default() };
        state.clear_applied_forces();
        assert!(state.qfrc_applied.iter().all(|f| *f == 0.0));
    }
}
