//! # Typed Scene Layout
//!
//! Named views over the engine's packed arrays, resolved once when a scene
//! loads. Every address is range-checked against the state arrays here, so
//! the per-tick code never does index arithmetic of its own.
//!
//! A layout is only valid for the model it was built from. Reloading a scene
//! means building a new one.

use skytrace_shared::Vec3;

use crate::engine::{BodyId, JointId, JointKind, ModelTopology, PhysicsState};
use crate::error::{LayoutError, LayoutResult};

/// A free joint's coordinates.
///
/// `qpos[qpos..qpos + 3]` is the translation (followed by a `wxyz`
/// orientation), `qvel[dof..dof + 3]` the linear velocity and
/// `qvel[dof + 3..dof + 6]` the angular velocity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JointRef {
    id: JointId,
    qpos: usize,
    dof: usize,
}

impl JointRef {
    /// Joint index.
    #[must_use]
    pub const fn id(&self) -> JointId {
        self.id
    }

    /// First position coordinate.
    #[must_use]
    pub const fn qpos_address(&self) -> usize {
        self.qpos
    }

    /// Current translation.
    #[must_use]
    pub fn translation(&self, state: &PhysicsState) -> Option<Vec3> {
        Vec3::from_slice_at(&state.qpos, self.qpos)
    }

    /// Overwrites the translation.
    pub fn set_translation(&self, state: &mut PhysicsState, position: Vec3) {
        write_vec3(&mut state.qpos, self.qpos, position);
    }

    /// Adds `delta` to the translation.
    pub fn offset_translation(&self, state: &mut PhysicsState, delta: Vec3) {
        if let Some(current) = self.translation(state) {
            self.set_translation(state, current + delta);
        }
    }

    /// Overwrites the linear velocity and zeroes the angular velocity.
    pub fn set_velocity(&self, state: &mut PhysicsState, linear: Vec3) {
        write_vec3(&mut state.qvel, self.dof, linear);
        write_vec3(&mut state.qvel, self.dof + 3, Vec3::ZERO);
    }
}

fn write_vec3(data: &mut [f64], offset: usize, v: Vec3) {
    if let Some(slot) = data.get_mut(offset..offset + 3) {
        slot.copy_from_slice(&v.to_array());
    }
}

/// Per-body view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyRef {
    id: BodyId,
    mass: f64,
    root: BodyId,
    mocap: Option<usize>,
    root_joint: Option<JointRef>,
}

impl BodyRef {
    /// Body index.
    #[must_use]
    pub const fn id(&self) -> BodyId {
        self.id
    }

    /// Body mass.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Kinematic root of this body's subtree.
    #[must_use]
    pub const fn root(&self) -> BodyId {
        self.root
    }

    /// Mocap slot, if this body is driven externally.
    #[must_use]
    pub const fn mocap_slot(&self) -> Option<usize> {
        self.mocap
    }

    /// Free joint of the kinematic root, if the root has one.
    #[must_use]
    pub const fn root_joint(&self) -> Option<JointRef> {
        self.root_joint
    }

    /// Adds `delta` to this body's mocap position. No-op for non-mocap bodies.
    pub fn offset_mocap(&self, state: &mut PhysicsState, delta: Vec3) {
        let Some(slot) = self.mocap else { return };
        if let Some(current) = Vec3::from_slice_at(&state.mocap_pos, slot * 3) {
            write_vec3(&mut state.mocap_pos, slot * 3, current + delta);
        }
    }
}

/// The flight chassis: first non-world body carrying its own free joint,
/// paired with the free joint of its kinematic root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChassisRef {
    /// Chassis body.
    pub body: BodyId,
    /// Free joint that positions it.
    pub joint: JointRef,
}

/// All typed views for one loaded model.
#[derive(Clone, Debug, Default)]
pub struct SceneLayout {
    bodies: Vec<BodyRef>,
    chassis: Option<ChassisRef>,
    light_count: usize,
    actuator_count: usize,
    timestep: f64,
}

impl SceneLayout {
    /// Resolves and validates every address table.
    ///
    /// # Errors
    ///
    /// Returns an error if a table has the wrong length or an address points
    /// outside the state arrays.
    pub fn build(topology: &ModelTopology, state: &PhysicsState) -> LayoutResult<Self> {
        let timestep = topology.timestep;
        if !timestep.is_finite() || timestep <= 0.0 {
            return Err(LayoutError::InvalidTimestep(timestep));
        }

        let nbody = topology.nbody();
        let njnt = topology.njnt();
        check_len("body_jntadr", nbody, topology.body_jntadr.len())?;
        check_len("body_rootid", nbody, topology.body_rootid.len())?;
        check_len("body_mocapid", nbody, topology.body_mocapid.len())?;
        check_len("jnt_qposadr", njnt, topology.jnt_qposadr.len())?;
        check_len("jnt_dofadr", njnt, topology.jnt_dofadr.len())?;

        // Each body's own first joint.
        let own_joint = topology
            .body_jntadr
            .iter()
            .enumerate()
            .map(|(body, &adr)| match usize::try_from(adr) {
                Err(_) => Ok(None),
                Ok(j) if j < njnt => Ok(Some(JointId(j))),
                Ok(_) => Err(LayoutError::JointOutOfRange { body, joint: adr, njnt }),
            })
            .collect::<LayoutResult<Vec<_>>>()?;

        let is_free = |joint: Option<JointId>| {
            joint.is_some_and(|j| topology.jnt_type[j.0] == JointKind::Free)
        };

        let mocap_slots = state.mocap_pos.len() / 3;
        let mut bodies = Vec::with_capacity(nbody);
        for body in 0..nbody {
            let root = topology.body_rootid[body];
            if root >= nbody {
                return Err(LayoutError::RootOutOfRange { body, root, nbody });
            }

            let raw_mocap = topology.body_mocapid[body];
            let mocap = match usize::try_from(raw_mocap) {
                Err(_) => None,
                Ok(slot) if slot < mocap_slots => Some(slot),
                Ok(_) => {
                    return Err(LayoutError::MocapOutOfRange {
                        body,
                        mocap: raw_mocap,
                        available: mocap_slots,
                    })
                }
            };

            let root_joint = match own_joint[root] {
                Some(j) if is_free(Some(j)) => Some(free_joint(topology, state, j)?),
                _ => None,
            };

            bodies.push(BodyRef {
                id: BodyId(body),
                mass: topology.body_mass[body],
                root: BodyId(root),
                mocap,
                root_joint,
            });
        }

        let chassis = (1..nbody)
            .find(|&b| is_free(own_joint[b]))
            .and_then(|b| {
                bodies[b].root_joint.map(|joint| ChassisRef { body: BodyId(b), joint })
            });

        Ok(Self {
            bodies,
            chassis,
            light_count: topology.nlight,
            actuator_count: state.ctrl.len(),
            timestep,
        })
    }

    /// A body by id.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&BodyRef> {
        self.bodies.get(id.0)
    }

    /// Every body, world included.
    #[must_use]
    pub fn bodies(&self) -> &[BodyRef] {
        &self.bodies
    }

    /// The flight chassis, if the model has one.
    #[must_use]
    pub const fn chassis(&self) -> Option<ChassisRef> {
        self.chassis
    }

    /// Number of lights.
    #[must_use]
    pub const fn light_count(&self) -> usize {
        self.light_count
    }

    /// Number of actuators.
    #[must_use]
    pub const fn actuator_count(&self) -> usize {
        self.actuator_count
    }

    /// Integration timestep in seconds.
    #[must_use]
    pub const fn timestep(&self) -> f64 {
        self.timestep
    }
}

fn check_len(table: &'static str, expected: usize, actual: usize) -> LayoutResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LayoutError::TableLength { table, expected, actual })
    }
}

fn free_joint(
    topology: &ModelTopology,
    state: &PhysicsState,
    joint: JointId,
) -> LayoutResult<JointRef> {
    let qpos = topology.jnt_qposadr[joint.0];
    let dof = topology.jnt_dofadr[joint.0];
    check_span(joint, "qpos", qpos, JointKind::Free.qpos_width(), state.qpos.len())?;
    check_span(joint, "qvel", dof, JointKind::Free.dof_width(), state.qvel.len())?;
    Ok(JointRef { id: joint, qpos, dof })
}

fn check_span(
    joint: JointId,
    array: &'static str,
    start: usize,
    width: usize,
    len: usize,
) -> LayoutResult<()> {
    let end = start.saturating_add(width);
    if end <= len {
        Ok(())
    } else {
        Err(LayoutError::AddressOutOfRange { joint: joint.0, array, start, end, len })
    }
}
