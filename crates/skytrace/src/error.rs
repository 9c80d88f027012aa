//! # Session Error Types

use std::path::PathBuf;

use skytrace_core::{EngineError, LayoutError};
use skytrace_replay::{ReplayError, TrajectoryError};
use thiserror::Error;

/// A scene or trajectory couldn't be loaded.
///
/// A failed fetch leaves the active scene untouched; a failed build leaves
/// no scene at all.
#[derive(Error, Debug)]
pub enum LoadError {
    /// An asset file couldn't be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Scene metadata didn't decode.
    #[error("failed to decode {path}: {source}")]
    Metadata {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A trajectory didn't decode.
    #[error("failed to decode {path}: {source}")]
    Trajectory {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: TrajectoryError,
    },

    /// The engine or scene graph rejected the model.
    #[error("failed to build scene {scene}: {reason}")]
    Build {
        /// Scene that failed.
        scene: String,
        /// Loader-provided description.
        reason: String,
    },

    /// The engine's address tables don't match its state.
    #[error("scene tables are inconsistent: {0}")]
    Layout(#[from] LayoutError),
}

/// A session operation failed.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Loading failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The engine faulted. The scene must be reloaded.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The operation needs a loaded scene.
    #[error("no scene loaded")]
    NoScene,

    /// Replay requested without a (non-empty) trajectory.
    #[error("no trajectory loaded")]
    NoTrajectory,

    /// Replay requested while one is running.
    #[error("a replay is already running")]
    ReplayAlreadyRunning,

    /// Pause toggled while the trajectory player owns physics.
    #[error("cannot change pause state while replaying")]
    ModeLocked,

    /// Noise parameters must be finite and non-negative.
    #[error("invalid noise parameters: correlation_time={correlation_time}, std_dev={std_dev}")]
    InvalidNoise {
        /// Rejected correlation time.
        correlation_time: f64,
        /// Rejected standard deviation.
        std_dev: f64,
    },
}

impl From<ReplayError> for SessionError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::NoTrajectory => Self::NoTrajectory,
            ReplayError::AlreadyRunning => Self::ReplayAlreadyRunning,
        }
    }
}

/// The session config couldn't be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file couldn't be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Malformed TOML or unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
