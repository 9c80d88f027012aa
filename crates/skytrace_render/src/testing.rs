//! Recording fake of the renderer.
//!
//! Enabled by the `testing` feature. Keeps the latest transform per node and
//! per instance slot, plus an ordered call log for phase-ordering checks.

use std::collections::{HashMap, HashSet};

use skytrace_shared::{InstanceTransform, Quaternion, Vec3};

use crate::renderer::{BatchId, NodeId, SceneRenderer};

/// One call into the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderCall {
    /// `set_node_transform`
    NodeTransform(NodeId),
    /// `set_instance_transform`
    InstanceTransform(BatchId, usize),
    /// `set_instance_count`
    InstanceCount(BatchId, usize),
    /// `spawn_marker`
    SpawnMarker(NodeId),
    /// `remove_node`
    RemoveNode(NodeId),
    /// `render_frame`
    RenderFrame,
}

/// Scene-graph double.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    next_node: u32,
    live: HashSet<NodeId>,
    markers: HashMap<NodeId, Vec3>,
    transforms: HashMap<NodeId, (Vec3, Quaternion)>,
    dirty: HashSet<NodeId>,
    instances: HashMap<(BatchId, usize), InstanceTransform>,
    counts: HashMap<BatchId, usize>,
    calls: Vec<RenderCall>,
    frames: usize,
    last_frame_dirty: usize,
}

impl RecordingRenderer {
    /// Empty scene graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest transform of a node.
    #[must_use]
    pub fn node_transform(&self, node: NodeId) -> Option<(Vec3, Quaternion)> {
        self.transforms.get(&node).copied()
    }

    /// Latest transform of an instance slot.
    #[must_use]
    pub fn instance(&self, batch: BatchId, index: usize) -> Option<InstanceTransform> {
        self.instances.get(&(batch, index)).copied()
    }

    /// Current draw count of a batch.
    #[must_use]
    pub fn instance_count(&self, batch: BatchId) -> Option<usize> {
        self.counts.get(&batch).copied()
    }

    /// Position of a live marker.
    #[must_use]
    pub fn marker_position(&self, node: NodeId) -> Option<Vec3> {
        self.markers.get(&node).copied()
    }

    /// Markers still in the scene.
    #[must_use]
    pub fn live_marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Nodes of any kind still in the scene.
    #[must_use]
    pub fn live_node_count(&self) -> usize {
        self.live.len()
    }

    /// Is `node` still in the scene?
    #[must_use]
    pub fn is_live(&self, node: NodeId) -> bool {
        self.live.contains(&node)
    }

    /// Frames drawn.
    #[must_use]
    pub const fn frames_rendered(&self) -> usize {
        self.frames
    }

    /// Nodes whose world matrix was dirty when the last frame was drawn.
    #[must_use]
    pub const fn last_frame_dirty(&self) -> usize {
        self.last_frame_dirty
    }

    /// Every call, in order.
    #[must_use]
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Forgets the call log.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl SceneRenderer for RecordingRenderer {
    fn create_node(&mut self) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.live.insert(node);
        node
    }

    fn set_node_transform(&mut self, node: NodeId, position: Vec3, orientation: Quaternion) {
        self.transforms.insert(node, (position, orientation));
        self.dirty.insert(node);
        self.calls.push(RenderCall::NodeTransform(node));
    }

    fn set_instance_transform(&mut self, batch: BatchId, index: usize, transform: InstanceTransform) {
        self.instances.insert((batch, index), transform);
        self.calls.push(RenderCall::InstanceTransform(batch, index));
    }

    fn set_instance_count(&mut self, batch: BatchId, count: usize) {
        self.counts.insert(batch, count);
        self.calls.push(RenderCall::InstanceCount(batch, count));
    }

    fn spawn_marker(&mut self, position: Vec3) -> NodeId {
        let node = self.create_node();
        self.markers.insert(node, position);
        self.calls.push(RenderCall::SpawnMarker(node));
        node
    }

    fn remove_node(&mut self, node: NodeId) {
        self.live.remove(&node);
        self.markers.remove(&node);
        self.transforms.remove(&node);
        self.dirty.remove(&node);
        self.calls.push(RenderCall::RemoveNode(node));
    }

    fn render_frame(&mut self) {
        self.frames += 1;
        self.last_frame_dirty = self.dirty.len();
        self.dirty.clear();
        self.calls.push(RenderCall::RenderFrame);
    }
}
