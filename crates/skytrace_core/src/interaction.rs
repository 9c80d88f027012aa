//! # Pointer Interaction
//!
//! Turns a pointer drag on a body into a physics perturbation.
//!
//! ```text
//!   pointer down ──▶ grab()      hit point stored in the body's local frame
//!   pointer move ──▶ move_pointer()
//!   every tick   ──▶ refresh     worldHit follows the body,
//!                                currentWorld = ray origin + dir * grab distance
//!   Live         ──▶ apply_running: force  (currentWorld - worldHit) * mass * gain
//!   Paused       ──▶ apply_paused:  offset (currentWorld - worldHit) * gain
//!   pointer up   ──▶ release()
//! ```
//!
//! Pointer geometry lives in rendering space. Forces and offsets cross into
//! physics space through [`render_to_physics`] right before they are written.

use skytrace_shared::constants::{DRAG_FORCE_GAIN, PAUSED_DRAG_GAIN};
use skytrace_shared::{
    physics_to_render, physics_to_render_quat, render_to_physics, Quaternion, Vec3,
};
use tracing::{debug, trace};

use crate::engine::{BodyId, PhysicsEngine, PhysicsState};
use crate::error::EngineResult;
use crate::layout::SceneLayout;

/// A pointer ray in rendering space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerRay {
    /// Camera-side origin.
    pub origin: Vec3,
    /// Direction; need not be normalized.
    pub direction: Vec3,
}

impl PointerRay {
    /// Creates a ray.
    #[must_use]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point `distance` along the ray. A zero direction yields the origin.
    #[must_use]
    pub fn point_at(&self, distance: f64) -> Vec3 {
        match self.direction.try_normalize() {
            Some(dir) => self.origin + dir * distance,
            None => self.origin,
        }
    }
}

/// Gains converting pointer displacement into physics input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionGains {
    /// Live mode: force per unit displacement per unit mass.
    pub force_gain: f64,
    /// Paused mode: pose offset per unit displacement, per tick.
    pub paused_gain: f64,
}

impl Default for InteractionGains {
    fn default() -> Self {
        Self { force_gain: DRAG_FORCE_GAIN, paused_gain: PAUSED_DRAG_GAIN }
    }
}

/// An in-progress drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    body: BodyId,
    local_hit: Vec3,
    grab_distance: f64,
    ray: PointerRay,
    world_hit: Vec3,
    current_world: Vec3,
}

impl DragSession {
    /// Selected body.
    #[must_use]
    pub const fn body(&self) -> BodyId {
        self.body
    }

    /// Grab point on the body, rendering space, as of the last refresh.
    #[must_use]
    pub const fn world_hit(&self) -> Vec3 {
        self.world_hit
    }

    /// Where the pointer wants the grab point to be, rendering space.
    #[must_use]
    pub const fn current_world(&self) -> Vec3 {
        self.current_world
    }

    /// Rendering-space displacement the drag is asking for.
    #[must_use]
    pub fn displacement(&self) -> Vec3 {
        self.current_world - self.world_hit
    }

    fn refresh(&mut self, state: &PhysicsState) {
        if let Some((position, rotation)) = render_pose(state, self.body) {
            self.world_hit = position + rotation.rotate(self.local_hit);
        }
        self.current_world = self.ray.point_at(self.grab_distance);
    }
}

/// What a drag did this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing is grabbed.
    Idle,
    /// A force or offset was written.
    Applied,
    /// The body has neither a mocap slot nor a free-jointed root; the drag
    /// stays active but moves nothing.
    NoRootJoint,
    /// The grabbed body isn't part of the current layout.
    UnknownBody,
}

/// Owns the drag session and converts it into physics input.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    gains: InteractionGains,
    session: Option<DragSession>,
}

impl InteractionController {
    /// Creates a controller with the given gains.
    #[must_use]
    pub const fn new(gains: InteractionGains) -> Self {
        Self { gains, session: None }
    }

    /// Current gains.
    #[must_use]
    pub const fn gains(&self) -> InteractionGains {
        self.gains
    }

    /// Active drag, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Is a body grabbed?
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a drag on `body` at rendering-space point `hit`.
    ///
    /// Returns `false` (and stays idle) for the world body or a body whose
    /// pose isn't in `state`.
    pub fn grab(&mut self, state: &PhysicsState, body: BodyId, hit: Vec3, ray: PointerRay) -> bool {
        if body == BodyId::WORLD {
            return false;
        }
        let Some((position, rotation)) = render_pose(state, body) else {
            debug!(body = body.0, "Grab ignored: body has no pose");
            return false;
        };

        let grab_distance = hit.distance(ray.origin);
        self.session = Some(DragSession {
            body,
            local_hit: rotation.conjugate().rotate(hit - position),
            grab_distance,
            ray,
            world_hit: hit,
            current_world: ray.point_at(grab_distance),
        });
        debug!(body = body.0, distance = grab_distance, "Grabbed body");
        true
    }

    /// Feeds the latest pointer ray into the active drag.
    pub fn move_pointer(&mut self, ray: PointerRay) {
        if let Some(session) = self.session.as_mut() {
            session.ray = ray;
        }
    }

    /// Ends the drag. Returns the body that was held.
    pub fn release(&mut self) -> Option<BodyId> {
        let released = self.session.take().map(|s| s.body);
        if let Some(body) = released {
            debug!(body = body.0, "Released body");
        }
        released
    }

    /// Live mode: applies the drag as a point force at the grab point.
    ///
    /// Called once per integration sub-step, after applied forces are cleared.
    ///
    /// # Errors
    ///
    /// Propagates a fault from the engine's force application.
    pub fn apply_running<E: PhysicsEngine>(
        &mut self,
        engine: &mut E,
        layout: &SceneLayout,
    ) -> EngineResult<DragOutcome> {
        let Some(session) = self.session.as_mut() else {
            return Ok(DragOutcome::Idle);
        };
        session.refresh(engine.state());
        let Some(body) = layout.body(session.body) else {
            return Ok(DragOutcome::UnknownBody);
        };

        let force = render_to_physics(session.displacement() * (body.mass() * self.gains.force_gain));
        let point = render_to_physics(session.world_hit);
        trace!(body = body.id().0, ?force, "Drag force");
        engine.apply_force_torque(force, Vec3::ZERO, point, body.id())?;
        Ok(DragOutcome::Applied)
    }

    /// Paused mode: nudges the body's mocap slot, or its root's free joint,
    /// toward the pointer.
    ///
    /// The caller re-derives kinematics afterwards.
    pub fn apply_paused(&mut self, state: &mut PhysicsState, layout: &SceneLayout) -> DragOutcome {
        let Some(session) = self.session.as_mut() else {
            return DragOutcome::Idle;
        };
        session.refresh(state);
        let Some(body) = layout.body(session.body) else {
            return DragOutcome::UnknownBody;
        };

        let offset = render_to_physics(session.displacement() * self.gains.paused_gain);
        if body.mocap_slot().is_some() {
            body.offset_mocap(state, offset);
            DragOutcome::Applied
        } else if let Some(joint) = body.root_joint() {
            joint.offset_translation(state, offset);
            DragOutcome::Applied
        } else {
            debug!(body = body.id().0, "Drag target has no rootable joint");
            DragOutcome::NoRootJoint
        }
    }
}

fn render_pose(state: &PhysicsState, body: BodyId) -> Option<(Vec3, Quaternion)> {
    let position = state.body_position(body)?;
    let rotation = state.body_orientation(body)?;
    Some((physics_to_render(position), physics_to_render_quat(rotation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{JointKind, ModelTopology};

    fn scene() -> (ModelTopology, PhysicsState) {
        let topology = ModelTopology {
            timestep: 0.002,
            body_mass: vec![0.0, 2.0, 1.0],
            body_jntadr: vec![-1, 0, -1],
            body_rootid: vec![0, 1, 2],
            body_mocapid: vec![-1, -1, -1],
            jnt_type: vec![JointKind::Free],
            jnt_qposadr: vec![0],
            jnt_dofadr: vec![0],
            ..ModelTopology::default()
        };
        let state = PhysicsState {
            qpos: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            qvel: vec![0.0; 6],
            xpos: vec![0.0; 9],
            xquat: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            ..PhysicsState::default()
        };
        (topology, state)
    }

    fn down_ray(x: f64) -> PointerRay {
        PointerRay::new(Vec3::new(x, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_world_body_is_not_draggable() {
        let (_, state) = scene();
        let mut drag = InteractionController::default();
        assert!(!drag.grab(&state, BodyId::WORLD, Vec3::ZERO, down_ray(0.0)));
        assert!(!drag.grab(&state, BodyId(9), Vec3::ZERO, down_ray(0.0)));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_paused_drag_offsets_root_joint() {
        let (topology, mut state) = scene();
        let layout = SceneLayout::build(&topology, &state).unwrap();
        let mut drag = InteractionController::default();

        assert!(drag.grab(&state, BodyId(1), Vec3::ZERO, down_ray(0.0)));
        drag.move_pointer(down_ray(1.0));
        assert_eq!(drag.apply_paused(&mut state, &layout), DragOutcome::Applied);

        assert_eq!(&state.qpos[0..3], &[0.3, 0.0, 0.0]);
    }

    #[test]
    fn test_paused_drag_without_root_joint_is_noop() {
        let (topology, mut state) = scene();
        let layout = SceneLayout::build(&topology, &state).unwrap();
        let mut drag = InteractionController::default();

        assert!(drag.grab(&state, BodyId(2), Vec3::ZERO, down_ray(0.0)));
        drag.move_pointer(down_ray(1.0));
        let before = state.clone();
        assert_eq!(drag.apply_paused(&mut state, &layout), DragOutcome::NoRootJoint);
        assert_eq!(state, before);
        // Still held.
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_grab_point_follows_body() {
        let (_, mut state) = scene();
        let mut drag = InteractionController::default();
        // Grab 0.5 above the body origin (rendering +Y is physics +Z).
        assert!(drag.grab(&state, BodyId(1), Vec3::new(0.0, 0.5, 0.0), down_ray(0.0)));

        // Body moves +1 along physics X.
        state.xpos[3] = 1.0;
        drag.session.as_mut().unwrap().refresh(&state);
        assert_eq!(drag.session().unwrap().world_hit(), Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_pointer_ray_point_at() {
        let ray = PointerRay::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(ray.point_at(5.0), Vec3::ZERO);
        assert_eq!(PointerRay::new(Vec3::X, Vec3::ZERO).point_at(3.0), Vec3::X);
    }

    #[test]
    fn test_release() {
        let (_, state) = scene();
        let mut drag = InteractionController::default();
        drag.grab(&state, BodyId(1), Vec3::ZERO, down_ray(0.0));
        assert_eq!(drag.release(), Some(BodyId(1)));
        assert_eq!(drag.release(), None);
    }
}
