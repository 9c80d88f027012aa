//! Breadcrumb markers dropped along a replayed trajectory.

use skytrace_shared::{physics_to_render, Vec3};

use crate::renderer::{NodeId, SceneRenderer};

/// Append-only marker set, cleared in full on a new scene or a new replay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerTrail {
    nodes: Vec<NodeId>,
}

impl MarkerTrail {
    /// Empty trail.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Drops a marker at a physics-space position.
    pub fn push<R: SceneRenderer + ?Sized>(&mut self, renderer: &mut R, position: Vec3) -> NodeId {
        let node = renderer.spawn_marker(physics_to_render(position));
        self.nodes.push(node);
        node
    }

    /// Removes every marker from the renderer.
    pub fn clear<R: SceneRenderer + ?Sized>(&mut self, renderer: &mut R) {
        for node in self.nodes.drain(..) {
            renderer.remove_node(node);
        }
    }

    /// Marker nodes, oldest first.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No markers?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRenderer;

    #[test]
    fn test_markers_are_converted_and_cleared() {
        let mut renderer = RecordingRenderer::new();
        let mut trail = MarkerTrail::new();

        let node = trail.push(&mut renderer, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(renderer.marker_position(node), Some(Vec3::new(1.0, 3.0, -2.0)));
        trail.push(&mut renderer, Vec3::ZERO);
        assert_eq!(trail.len(), 2);

        trail.clear(&mut renderer);
        assert!(trail.is_empty());
        assert_eq!(renderer.live_marker_count(), 0);
    }
}
