//! # Renderer Seam
//!
//! The scene graph is an external collaborator. SKYTRACE hands it
//! rendering-space transforms and asks it to draw; nothing else.

use skytrace_shared::{InstanceTransform, Quaternion, Vec3};

/// Handle to a renderable node owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Handle to an instanced-primitive batch owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u32);

/// The external scene-graph renderer.
///
/// All arguments are in rendering space (Y-up).
pub trait SceneRenderer {
    /// Creates an empty node for a body or light. The scene loader attaches
    /// geometry to it.
    fn create_node(&mut self) -> NodeId;

    /// Sets a node's local transform and marks its world matrix dirty.
    fn set_node_transform(&mut self, node: NodeId, position: Vec3, orientation: Quaternion);

    /// Sets one instance of a batch.
    fn set_instance_transform(&mut self, batch: BatchId, index: usize, transform: InstanceTransform);

    /// Sets how many instances of a batch are drawn.
    fn set_instance_count(&mut self, batch: BatchId, count: usize);

    /// Creates a breadcrumb marker node at `position`.
    fn spawn_marker(&mut self, position: Vec3) -> NodeId;

    /// Removes a node from the scene graph.
    fn remove_node(&mut self, node: NodeId);

    /// Draws the current scene graph.
    fn render_frame(&mut self);
}
