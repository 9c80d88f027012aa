//! Body and light node tables.
//!
//! One renderable node per exposed physics body or light, keyed by the
//! physics index. Built by the scene loader; torn down in full before the
//! next scene is built.

use skytrace_core::{BodyId, LightId};
use tracing::debug;

use crate::renderer::{NodeId, SceneRenderer};

/// Maps physics indices to renderer nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTable {
    bodies: Vec<Option<NodeId>>,
    lights: Vec<Option<NodeId>>,
}

impl NodeTable {
    /// Empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { bodies: Vec::new(), lights: Vec::new() }
    }

    /// Binds `node` to `body`, returning the node it replaced.
    pub fn bind_body(&mut self, body: BodyId, node: NodeId) -> Option<NodeId> {
        bind(&mut self.bodies, body.0, node)
    }

    /// Binds `node` to `light`, returning the node it replaced.
    pub fn bind_light(&mut self, light: LightId, node: NodeId) -> Option<NodeId> {
        bind(&mut self.lights, light.0, node)
    }

    /// Node bound to `body`.
    #[must_use]
    pub fn body_node(&self, body: BodyId) -> Option<NodeId> {
        self.bodies.get(body.0).copied().flatten()
    }

    /// Node bound to `light`.
    #[must_use]
    pub fn light_node(&self, light: LightId) -> Option<NodeId> {
        self.lights.get(light.0).copied().flatten()
    }

    /// Bound bodies in index order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, NodeId)> + '_ {
        self.bodies.iter().enumerate().filter_map(|(i, n)| n.map(|n| (BodyId(i), n)))
    }

    /// Bound lights in index order.
    pub fn lights(&self) -> impl Iterator<Item = (LightId, NodeId)> + '_ {
        self.lights.iter().enumerate().filter_map(|(i, n)| n.map(|n| (LightId(i), n)))
    }

    /// Number of bound nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies().count() + self.lights().count()
    }

    /// No nodes bound?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every bound node from the renderer and empties the table.
    pub fn teardown<R: SceneRenderer + ?Sized>(&mut self, renderer: &mut R) {
        let removed = self.len();
        for node in self.bodies.drain(..).chain(self.lights.drain(..)).flatten() {
            renderer.remove_node(node);
        }
        if removed > 0 {
            debug!(removed, "Tore down scene nodes");
        }
    }
}

fn bind(slots: &mut Vec<Option<NodeId>>, index: usize, node: NodeId) -> Option<NodeId> {
    if slots.len() <= index {
        slots.resize(index + 1, None);
    }
    slots[index].replace(node)
}
