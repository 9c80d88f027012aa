//! # Control Noise
//!
//! Ornstein–Uhlenbeck jitter on actuator controls, applied before every
//! integration sub-step:
//!
//! ```text
//! rate  = exp(-dt / tau)
//! scale = sigma * sqrt(1 - rate^2)
//! ctrl' = rate * ctrl + scale * N(0, 1)
//! ```
//!
//! Normals come from a seeded `ChaCha8Rng`, so a session replays the same
//! noise for the same seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Floor on the correlation time, keeps `dt / tau` finite.
const MIN_CORRELATION_TIME: f64 = 1e-10;

/// Correlated actuator noise source.
#[derive(Clone, Debug)]
pub struct ControlNoise {
    correlation_time: f64,
    std_dev: f64,
    rng: ChaCha8Rng,
}

impl ControlNoise {
    /// Creates a noise source. A zero `std_dev` disables it.
    #[must_use]
    pub fn new(correlation_time: f64, std_dev: f64, seed: u64) -> Self {
        Self { correlation_time, std_dev, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Disabled noise source.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0.0, 0.0, 0)
    }

    /// Replaces the correlation time and standard deviation.
    pub fn set_params(&mut self, correlation_time: f64, std_dev: f64) {
        self.correlation_time = correlation_time;
        self.std_dev = std_dev;
    }

    /// Correlation time (seconds).
    #[must_use]
    pub const fn correlation_time(&self) -> f64 {
        self.correlation_time
    }

    /// Standard deviation.
    #[must_use]
    pub const fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Whether `perturb` changes anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.std_dev > 0.0
    }

    /// `(rate, scale)` for a sub-step of `dt` seconds.
    #[must_use]
    pub fn coefficients(&self, dt: f64) -> (f64, f64) {
        let rate = (-dt / self.correlation_time.max(MIN_CORRELATION_TIME)).exp();
        let scale = self.std_dev * (1.0 - rate * rate).sqrt();
        (rate, scale)
    }

    /// Applies one OU update to every control.
    pub fn perturb(&mut self, ctrl: &mut [f64], dt: f64) {
        if !self.is_active() {
            return;
        }
        let (rate, scale) = self.coefficients(dt);
        for c in ctrl.iter_mut() {
            *c = rate * *c + scale * self.standard_normal();
        }
    }

    /// Box–Muller.
    fn standard_normal(&mut self) -> f64 {
        // gen() is [0, 1); flip it so ln never sees zero.
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

impl Default for ControlNoise {
    fn default() -> Self {
        Self::disabled()
    }
}
