//! Simulation mode.

use std::fmt;

/// Which path advances physics state on the next tick.
///
/// The three paths are mutually exclusive. `Live` and `Paused` toggle into
/// each other; either one enters `Replaying` when a replay runs, and replay
/// always exits to `Live` on stop or completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SimMode {
    /// The stepper integrates physics, drag applies forces.
    #[default]
    Live,
    /// No integration; drag edits poses directly and kinematics are
    /// re-derived every tick.
    Paused,
    /// The trajectory player owns physics state.
    Replaying,
}

impl SimMode {
    /// Does the stepper integrate in this mode?
    #[must_use]
    pub const fn integrates(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Does pointer interaction mutate physics in this mode?
    #[must_use]
    pub const fn accepts_drag(self) -> bool {
        !matches!(self, Self::Replaying)
    }
}

impl fmt::Display for SimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Live => "live",
            Self::Paused => "paused",
            Self::Replaying => "replaying",
        };
        f.write_str(name)
    }
}
