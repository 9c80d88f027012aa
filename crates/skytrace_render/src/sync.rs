//! # Pose Sync
//!
//! Copies physics poses into renderable transforms once per tick, after
//! physics has been mutated and before the draw call.
//!
//! ```text
//! PhysicsState ──physics_to_render──▶ body nodes      (position + orientation)
//!              ──physics_to_render──▶ light nodes     (position + look-at)
//!              ──physics_to_render──▶ cylinder batch  (one per valid wrap segment)
//!              ──physics_to_render──▶ sphere batch    (wrap endpoints, then flex vertices)
//! ```
//!
//! Instance counts are recomputed every tick: wrap segments come and go as
//! tendons wrap around geometry.

use skytrace_core::{ModelTopology, PhysicsState};
use skytrace_shared::constants::{FLEX_VERTEX_RADIUS, WRAP_VALID_EPSILON};
use skytrace_shared::{physics_to_render, physics_to_render_quat, InstanceTransform, Quaternion, Vec3};
use tracing::trace;

use crate::nodes::NodeTable;
use crate::renderer::{BatchId, SceneRenderer};

/// Configuration for pose sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// Radius of the sphere drawn at each flex vertex.
    pub flex_vertex_radius: f64,
    /// Wrap points closer than this to the origin are unset and not drawn.
    pub wrap_valid_epsilon: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { flex_vertex_radius: FLEX_VERTEX_RADIUS, wrap_valid_epsilon: WRAP_VALID_EPSILON }
    }
}

/// The instanced batches a scene draws tendons and flexes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceBatches {
    /// Sphere batch: wrap endpoints, then flex vertices.
    pub spheres: BatchId,
    /// Maximum sphere instances.
    pub sphere_capacity: usize,
    /// Cylinder batch: one per wrap segment.
    pub cylinders: BatchId,
    /// Maximum cylinder instances.
    pub cylinder_capacity: usize,
}

/// Statistics from one sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Body nodes written.
    pub bodies_synced: u32,
    /// Light nodes written.
    pub lights_synced: u32,
    /// Bound nodes whose index has no pose in state.
    pub skipped: u32,
    /// Cylinder instances drawn.
    pub cylinders: u32,
    /// Sphere instances drawn.
    pub spheres: u32,
    /// Some instances didn't fit their batch.
    pub truncated: bool,
}

/// Per-tick physics-to-render copy.
#[derive(Debug, Clone, Default)]
pub struct PoseSync {
    config: SyncConfig,
    stats: SyncStats,
}

impl PoseSync {
    /// Creates a sync pass.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self { config, stats: SyncStats::default() }
    }

    /// Stats from the last sync.
    #[must_use]
    pub const fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Writes every tracked transform.
    pub fn sync<R: SceneRenderer + ?Sized>(
        &mut self,
        topology: &ModelTopology,
        state: &PhysicsState,
        nodes: &NodeTable,
        batches: Option<&InstanceBatches>,
        renderer: &mut R,
    ) -> SyncStats {
        let mut stats = SyncStats::default();

        for (body, node) in nodes.bodies() {
            match (state.body_position(body), state.body_orientation(body)) {
                (Some(p), Some(q)) => {
                    renderer.set_node_transform(node, physics_to_render(p), physics_to_render_quat(q));
                    stats.bodies_synced += 1;
                }
                _ => stats.skipped += 1,
            }
        }

        for (light, node) in nodes.lights() {
            match (state.light_position(light), state.light_direction(light)) {
                (Some(p), Some(d)) => {
                    renderer.set_node_transform(node, physics_to_render(p), look_along(physics_to_render(d)));
                    stats.lights_synced += 1;
                }
                _ => stats.skipped += 1,
            }
        }

        if let Some(batches) = batches {
            let mut writer = BatchWriter { batches, renderer, truncated: false };
            let (cylinders, wrap_spheres) = self.sync_tendons(topology, state, &mut writer);
            let spheres = self.sync_flex(topology, state, wrap_spheres, &mut writer);

            let cylinders = cylinders.min(batches.cylinder_capacity);
            let spheres = spheres.min(batches.sphere_capacity);
            stats.truncated = writer.truncated;
            writer.renderer.set_instance_count(batches.cylinders, cylinders);
            writer.renderer.set_instance_count(batches.spheres, spheres);
            stats.cylinders = u32::try_from(cylinders).unwrap_or(u32::MAX);
            stats.spheres = u32::try_from(spheres).unwrap_or(u32::MAX);
        }

        trace!(
            bodies = stats.bodies_synced,
            lights = stats.lights_synced,
            cylinders = stats.cylinders,
            spheres = stats.spheres,
            "Pose sync"
        );
        self.stats = stats;
        stats
    }

    /// Returns `(cylinders written, spheres written)`.
    ///
    /// Every valid wrap endpoint gets its own sphere slot. A segment whose
    /// start is the previous segment's end in the same tendon reuses that
    /// sphere instead of drawing the joint twice.
    fn sync_tendons<R: SceneRenderer + ?Sized>(
        &self,
        topology: &ModelTopology,
        state: &PhysicsState,
        writer: &mut BatchWriter<'_, R>,
    ) -> (usize, usize) {
        let eps = self.config.wrap_valid_epsilon;
        let mut cylinders = 0;
        let mut spheres = 0;

        for (tendon, &radius) in topology.tendon_width.iter().enumerate() {
            let (Some(&first), Some(&count)) =
                (state.ten_wrapadr.get(tendon), state.ten_wrapnum.get(tendon))
            else {
                continue;
            };
            // Wrap point that owns the most recent sphere of this tendon.
            let mut last_sphere = None;

            for w in first..(first + count).saturating_sub(1) {
                let (Some(a), Some(b)) = (state.wrap_point(w), state.wrap_point(w + 1)) else {
                    continue;
                };
                let start = physics_to_render(a);
                let end = physics_to_render(b);
                let valid_start = start.length() > eps;
                let valid_end = end.length() > eps;

                if valid_start && last_sphere != Some(w) {
                    writer.sphere(spheres, InstanceTransform::sphere(start, radius));
                    spheres += 1;
                }
                if valid_end {
                    writer.sphere(spheres, InstanceTransform::sphere(end, radius));
                    spheres += 1;
                    last_sphere = Some(w + 1);
                }
                if valid_start && valid_end {
                    let axis = (end - start).try_normalize();
                    let rotation = axis.map_or(Quaternion::IDENTITY, |dir| Quaternion::from_unit_vectors(Vec3::Y, dir));
                    writer.cylinder(
                        cylinders,
                        InstanceTransform::new(
                            start.midpoint(end),
                            rotation,
                            Vec3::new(radius, start.distance(end), radius),
                        ),
                    );
                    cylinders += 1;
                }
            }
        }

        (cylinders, spheres)
    }

    /// Appends one sphere per flex vertex after `first_slot`. Returns the
    /// total sphere count.
    fn sync_flex<R: SceneRenderer + ?Sized>(
        &self,
        topology: &ModelTopology,
        state: &PhysicsState,
        first_slot: usize,
        writer: &mut BatchWriter<'_, R>,
    ) -> usize {
        let r = self.config.flex_vertex_radius;
        let mut slot = first_slot;
        for (&first, &count) in topology.flex_vertadr.iter().zip(&topology.flex_vertnum) {
            for vertex in first..first + count {
                if let Some(p) = state.flex_vertex(vertex) {
                    writer.sphere(slot, InstanceTransform::sphere(physics_to_render(p), r));
                    slot += 1;
                }
            }
        }
        slot
    }
}

/// Orientation whose local -Z points along `direction`.
#[must_use]
pub fn look_along(direction: Vec3) -> Quaternion {
    direction
        .try_normalize()
        .map_or(Quaternion::IDENTITY, |dir| Quaternion::from_unit_vectors(-Vec3::Z, dir))
}

/// Capacity-checked instance writes.
struct BatchWriter<'a, R: SceneRenderer + ?Sized> {
    batches: &'a InstanceBatches,
    renderer: &'a mut R,
    truncated: bool,
}

impl<R: SceneRenderer + ?Sized> BatchWriter<'_, R> {
    fn sphere(&mut self, index: usize, transform: InstanceTransform) {
        if index < self.batches.sphere_capacity {
            self.renderer.set_instance_transform(self.batches.spheres, index, transform);
        } else {
            self.truncated = true;
        }
    }

    fn cylinder(&mut self, index: usize, transform: InstanceTransform) {
        if index < self.batches.cylinder_capacity {
            self.renderer.set_instance_transform(self.batches.cylinders, index, transform);
        } else {
            self.truncated = true;
        }
    }
}
