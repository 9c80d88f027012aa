//! # Session Configuration
//!
//! Loaded once at startup from TOML. Every key is optional:
//!
//! ```toml
//! [stepper]
//! max_catch_up_ms = 35.0
//!
//! [interaction]
//! force_gain = 250.0
//! paused_gain = 0.3
//!
//! [replay]
//! speed_divisor = 3
//! marker_interval = 10
//!
//! [noise]
//! correlation_time = 0.0
//! std_dev = 0.0
//! seed = 0
//!
//! [visuals]
//! flex_vertex_radius = 0.01
//! wrap_valid_epsilon = 0.01
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skytrace_core::{ControlNoise, InteractionGains};
use skytrace_render::SyncConfig;
use skytrace_replay::ReplayConfig;
use skytrace_shared::constants::{
    DRAG_FORCE_GAIN, FLEX_VERTEX_RADIUS, MARKER_INTERVAL, MAX_CATCH_UP_MS, PAUSED_DRAG_GAIN,
    REPLAY_SPEED_DIVISOR, WRAP_VALID_EPSILON,
};

use crate::error::ConfigError;

/// `[stepper]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepperSection {
    /// Backlog beyond which simulated time snaps to render time.
    pub max_catch_up_ms: f64,
}

impl Default for StepperSection {
    fn default() -> Self {
        Self { max_catch_up_ms: MAX_CATCH_UP_MS }
    }
}

/// `[interaction]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionSection {
    /// Live drag: force per unit displacement per unit mass.
    pub force_gain: f64,
    /// Paused drag: pose offset per unit displacement per tick.
    pub paused_gain: f64,
}

impl Default for InteractionSection {
    fn default() -> Self {
        Self { force_gain: DRAG_FORCE_GAIN, paused_gain: PAUSED_DRAG_GAIN }
    }
}

/// `[replay]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplaySection {
    /// Render ticks per replayed frame.
    pub speed_divisor: u32,
    /// Frames between breadcrumb markers.
    pub marker_interval: usize,
}

impl Default for ReplaySection {
    fn default() -> Self {
        Self { speed_divisor: REPLAY_SPEED_DIVISOR, marker_interval: MARKER_INTERVAL }
    }
}

/// `[noise]`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseSection {
    /// Ornstein–Uhlenbeck correlation time, seconds.
    pub correlation_time: f64,
    /// Standard deviation; 0 disables noise.
    pub std_dev: f64,
    /// RNG seed.
    pub seed: u64,
}

/// `[visuals]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualsSection {
    /// Flex vertex sphere radius.
    pub flex_vertex_radius: f64,
    /// Wrap points this close to the origin are not drawn.
    pub wrap_valid_epsilon: f64,
}

impl Default for VisualsSection {
    fn default() -> Self {
        Self { flex_vertex_radius: FLEX_VERTEX_RADIUS, wrap_valid_epsilon: WRAP_VALID_EPSILON }
    }
}

/// Whole session configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Physics stepper.
    pub stepper: StepperSection,
    /// Pointer drag gains.
    pub interaction: InteractionSection,
    /// Trajectory replay.
    pub replay: ReplaySection,
    /// Control noise.
    pub noise: NoiseSection,
    /// Instanced visuals.
    pub visuals: VisualsSection,
}

impl SessionConfig {
    /// Parses and validates TOML.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML, unknown keys or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, or as [`Self::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    /// Checks ranges.
    ///
    /// # Errors
    ///
    /// Names the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("stepper.max_catch_up_ms", self.stepper.max_catch_up_ms),
            ("interaction.force_gain", self.interaction.force_gain),
            ("interaction.paused_gain", self.interaction.paused_gain),
            ("noise.correlation_time", self.noise.correlation_time),
            ("noise.std_dev", self.noise.std_dev),
            ("visuals.flex_vertex_radius", self.visuals.flex_vertex_radius),
            ("visuals.wrap_valid_epsilon", self.visuals.wrap_valid_epsilon),
        ];
        for (key, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{key} must be finite and >= 0, got {value}")));
            }
        }
        if self.replay.speed_divisor == 0 {
            return Err(ConfigError::Invalid("replay.speed_divisor must be >= 1".into()));
        }
        if self.replay.marker_interval == 0 {
            return Err(ConfigError::Invalid("replay.marker_interval must be >= 1".into()));
        }
        Ok(())
    }

    /// Drag gains.
    #[must_use]
    pub const fn gains(&self) -> InteractionGains {
        InteractionGains {
            force_gain: self.interaction.force_gain,
            paused_gain: self.interaction.paused_gain,
        }
    }

    /// Replay tuning.
    #[must_use]
    pub const fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            speed_divisor: self.replay.speed_divisor,
            marker_interval: self.replay.marker_interval,
        }
    }

    /// Pose sync tuning.
    #[must_use]
    pub const fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            flex_vertex_radius: self.visuals.flex_vertex_radius,
            wrap_valid_epsilon: self.visuals.wrap_valid_epsilon,
        }
    }

    /// Seeded noise source.
    #[must_use]
    pub fn noise(&self) -> ControlNoise {
        ControlNoise::new(self.noise.correlation_time, self.noise.std_dev, self.noise.seed)
    }
}
