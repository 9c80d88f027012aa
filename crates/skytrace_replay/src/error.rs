//! # Replay Error Types

use thiserror::Error;

/// A trajectory file couldn't be decoded.
#[derive(Error, Debug)]
pub enum TrajectoryError {
    /// Malformed JSON, or a frame with the wrong shape.
    #[error("failed to decode trajectory: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A replay command was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// `run` with no trajectory, or an empty one.
    #[error("no trajectory data loaded")]
    NoTrajectory,

    /// `run` while a replay is already running.
    #[error("a replay is already running")]
    AlreadyRunning,
}

/// Result type for replay commands.
pub type ReplayResult<T> = Result<T, ReplayError>;
