//! # Scene Loading
//!
//! Scenes live in an asset tree keyed by agent type and obstacle count:
//!
//! ```text
//! Agents/
//! └── {agent}/
//!     └── obstacles_{n}/
//!         ├── map.xml                    model description
//!         ├── map_metadata.json          start / goal / obstacle count
//!         └── trajectories/
//!             └── trajectory.json        recorded flight
//! ```
//!
//! Loading is split in two so a failed fetch can't disturb the running
//! scene: [`SceneSource::fetch_scene`] has no side effects, and only once it
//! succeeds does the session tear down the old scene and call
//! [`SceneSource::build_scene`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skytrace_core::PhysicsEngine;
use skytrace_render::{InstanceBatches, NodeTable, SceneRenderer};
use skytrace_replay::Trajectory;
use tracing::debug;

use crate::error::LoadError;

/// Which scene to load.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SceneKey {
    /// Agent type directory name.
    pub agent: String,
    /// Obstacle count.
    pub obstacles: u32,
}

impl SceneKey {
    /// Creates a key.
    #[must_use]
    pub fn new(agent: impl Into<String>, obstacles: u32) -> Self {
        Self { agent: agent.into(), obstacles }
    }

    /// Scene directory, relative to the asset root.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        Path::new("Agents").join(&self.agent).join(format!("obstacles_{}", self.obstacles))
    }

    /// Model description.
    #[must_use]
    pub fn scene_path(&self) -> PathBuf {
        self.directory().join("map.xml")
    }

    /// Scene metadata.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.directory().join("map_metadata.json")
    }

    /// Recorded trajectory.
    #[must_use]
    pub fn trajectory_path(&self) -> PathBuf {
        self.directory().join("trajectories").join("trajectory.json")
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/obstacles_{}", self.agent, self.obstacles)
    }
}

/// Contents of `map_metadata.json`. Unknown keys are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Obstacles in the map.
    pub obstacle_count: u32,
    /// Flight start, physics space.
    pub start_position: [f64; 3],
    /// Flight goal, physics space.
    pub goal_position: [f64; 3],
}

impl SceneMetadata {
    /// Decodes the JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or missing keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for SceneMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [sx, sy, sz] = self.start_position;
        let [gx, gy, gz] = self.goal_position;
        write!(
            f,
            "Obstacles: {}, Start: ({sx:.2}, {sy:.2}, {sz:.2}), Goal: ({gx:.2}, {gy:.2}, {gz:.2})",
            self.obstacle_count
        )
    }
}

/// Everything fetched for a scene, before anything is built.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescriptor {
    /// Scene key.
    pub key: SceneKey,
    /// Model description text.
    pub model: String,
    /// Decoded metadata.
    pub metadata: SceneMetadata,
}

/// A scene ready to simulate.
#[derive(Debug)]
pub struct BuiltScene<E> {
    /// Loaded engine.
    pub engine: E,
    /// Nodes created for bodies and lights.
    pub nodes: NodeTable,
    /// Instanced batches for tendons and flexes, if the scene has any.
    pub batches: Option<InstanceBatches>,
    /// Scene metadata.
    pub metadata: SceneMetadata,
}

/// Where scenes and trajectories come from.
pub trait SceneSource {
    /// Engine type produced by `build_scene`.
    type Engine: PhysicsEngine;

    /// Fetches a scene's files. Must not touch the renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if any file is missing or malformed.
    fn fetch_scene(&mut self, key: &SceneKey) -> Result<SceneDescriptor, LoadError>;

    /// Loads the model into a new engine and creates its nodes.
    ///
    /// On error, any nodes already created must be removed again.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine or renderer rejects the model.
    fn build_scene(
        &mut self,
        descriptor: &SceneDescriptor,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<BuiltScene<Self::Engine>, LoadError>;

    /// Fetches a scene's recorded trajectory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    fn fetch_trajectory(&mut self, key: &SceneKey) -> Result<Trajectory, LoadError>;
}

/// Turns a fetched model description into an engine plus nodes.
pub trait ModelLoader {
    /// Engine type produced.
    type Engine: PhysicsEngine;

    /// See [`SceneSource::build_scene`].
    ///
    /// # Errors
    ///
    /// Returns an error if the engine or renderer rejects the model.
    fn build(
        &mut self,
        descriptor: &SceneDescriptor,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<BuiltScene<Self::Engine>, LoadError>;
}

/// [`SceneSource`] over an on-disk asset tree.
#[derive(Debug)]
pub struct AssetDirectory<L> {
    root: PathBuf,
    loader: L,
}

impl<L> AssetDirectory<L> {
    /// Serves scenes from `root`, building them with `loader`.
    pub fn new(root: impl Into<PathBuf>, loader: L) -> Self {
        Self { root: root.into(), loader }
    }

    /// Asset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, relative: &Path) -> Result<(PathBuf, String), LoadError> {
        let path = self.root.join(relative);
        debug!(path = %path.display(), "Reading asset");
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok((path, text)),
            Err(source) => Err(LoadError::Io { path, source }),
        }
    }
}

impl<L: ModelLoader> SceneSource for AssetDirectory<L> {
    type Engine = L::Engine;

    fn fetch_scene(&mut self, key: &SceneKey) -> Result<SceneDescriptor, LoadError> {
        let (_, model) = self.read(&key.scene_path())?;
        let (path, json) = self.read(&key.metadata_path())?;
        let metadata =
            SceneMetadata::from_json(&json).map_err(|source| LoadError::Metadata { path, source })?;
        Ok(SceneDescriptor { key: key.clone(), model, metadata })
    }

    fn build_scene(
        &mut self,
        descriptor: &SceneDescriptor,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<BuiltScene<Self::Engine>, LoadError> {
        self.loader.build(descriptor, renderer)
    }

    fn fetch_trajectory(&mut self, key: &SceneKey) -> Result<Trajectory, LoadError> {
        let (path, json) = self.read(&key.trajectory_path())?;
        Trajectory::from_json(&json).map_err(|source| LoadError::Trajectory { path, source })
    }
}
