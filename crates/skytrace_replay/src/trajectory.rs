//! Recorded trajectories.
//!
//! On disk a trajectory is a JSON array of frames:
//!
//! ```json
//! [
//!   { "position": [0.0, 0.0, 1.0], "velocity": [0.5, 0.0, 0.0], "step": 0 },
//!   { "position": [0.001, 0.0, 1.0] }
//! ]
//! ```
//!
//! Positions and velocities are in physics space. A vector with other than
//! three components fails the whole decode.

use serde::{Deserialize, Serialize};
use skytrace_shared::Vec3;

use crate::error::TrajectoryError;

/// One recorded sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFrame", into = "RawFrame")]
pub struct TrajectoryFrame {
    /// Chassis position.
    pub position: Vec3,
    /// Chassis linear velocity, if recorded.
    pub velocity: Option<Vec3>,
    /// Recorder's step number, if recorded.
    pub step: Option<u64>,
}

impl TrajectoryFrame {
    /// Position-only frame.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self { position, velocity: None, step: None }
    }
}

/// Wire shape: bare arrays instead of `{x, y, z}` objects.
#[derive(Serialize, Deserialize)]
struct RawFrame {
    position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    velocity: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    step: Option<u64>,
}

impl From<RawFrame> for TrajectoryFrame {
    fn from(raw: RawFrame) -> Self {
        Self {
            position: Vec3::from_array(raw.position),
            velocity: raw.velocity.map(Vec3::from_array),
            step: raw.step,
        }
    }
}

impl From<TrajectoryFrame> for RawFrame {
    fn from(frame: TrajectoryFrame) -> Self {
        Self {
            position: frame.position.to_array(),
            velocity: frame.velocity.map(Vec3::to_array),
            step: frame.step,
        }
    }
}

/// Ordered, finite sequence of frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    frames: Vec<TrajectoryFrame>,
}

impl Trajectory {
    /// Wraps frames.
    #[must_use]
    pub const fn new(frames: Vec<TrajectoryFrame>) -> Self {
        Self { frames }
    }

    /// Decodes the JSON array form.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or a malformed frame.
    pub fn from_json(json: &str) -> Result<Self, TrajectoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes the JSON array form from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or a malformed frame.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, TrajectoryError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// All frames.
    #[must_use]
    pub fn frames(&self) -> &[TrajectoryFrame] {
        &self.frames
    }

    /// A frame by index.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&TrajectoryFrame> {
        self.frames.get(index)
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// No frames?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<TrajectoryFrame> for Trajectory {
    fn from_iter<I: IntoIterator<Item = TrajectoryFrame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_optional_fields() {
        let json = r#"[
            { "position": [0.0, 0.0, 1.0], "velocity": [0.5, 0.0, 0.0], "step": 7 },
            { "position": [0.1, 0.0, 1.0] }
        ]"#;
        let trajectory = Trajectory::from_json(json).unwrap();
        assert_eq!(trajectory.len(), 2);

        let first = trajectory.frame(0).unwrap();
        assert_eq!(first.position, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(first.velocity, Some(Vec3::new(0.5, 0.0, 0.0)));
        assert_eq!(first.step, Some(7));

        assert_eq!(trajectory.frame(1), Some(&TrajectoryFrame::at(Vec3::new(0.1, 0.0, 1.0))));
    }

    #[test]
    fn test_rejects_malformed_frames() {
        assert!(Trajectory::from_json(r#"[{ "position": [1.0, 2.0] }]"#).is_err());
        assert!(Trajectory::from_json(r#"[{ "velocity": [1.0, 2.0, 3.0] }]"#).is_err());
        assert!(Trajectory::from_json(r#"{ "position": [1.0, 2.0, 3.0] }"#).is_err());
        assert!(Trajectory::from_json("[]").unwrap().is_empty());
    }

    #[test]
    fn test_encodes_as_arrays() {
        let trajectory: Trajectory = [TrajectoryFrame::at(Vec3::new(1.0, 2.0, 3.0))].into_iter().collect();
        let json = serde_json::to_string(&trajectory).unwrap();
        assert_eq!(json, r#"[{"position":[1.0,2.0,3.0]}]"#);
    }
}
