//! # SKYTRACE Render
//!
//! Hands physics poses to an external scene graph.
//!
//! ## Modules
//!
//! - [`renderer`]: the renderer seam
//! - [`nodes`]: body / light node tables
//! - [`sync`]: Pose Sync, including instanced tendon and flex batches
//! - [`markers`]: replay breadcrumbs

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod markers;
pub mod nodes;
pub mod renderer;
pub mod sync;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use markers::MarkerTrail;
pub use nodes::NodeTable;
pub use renderer::{BatchId, NodeId, SceneRenderer};
pub use sync::{look_along, InstanceBatches, PoseSync, SyncConfig, SyncStats};
