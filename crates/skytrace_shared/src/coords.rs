//! # Coordinate Conversion
//!
//! The physics engine is Z-up; the renderer is Y-up. The mapping is a fixed
//! axis permutation with one sign flip:
//!
//! ```text
//!   physics (x, y, z)  ──►  rendering (x, z, -y)
//!   rendering (x, y, z) ──► physics  (x, -z, y)
//! ```
//!
//! Orientations carry the same permutation on their vector part; the scalar
//! part is untouched. Every conversion is a pure swizzle plus negation, so a
//! round trip is bit-exact (signed zeros included).
//!
//! Directions, forces and offsets convert exactly like positions.

use crate::math::{Quaternion, Vec3};

/// Converts a physics-space position or direction to rendering space.
#[inline]
#[must_use]
pub const fn physics_to_render(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Converts a rendering-space position or direction to physics space.
#[inline]
#[must_use]
pub const fn render_to_physics(v: Vec3) -> Vec3 {
    Vec3::new(v.x, -v.z, v.y)
}

/// Converts a physics-space orientation to rendering space.
#[inline]
#[must_use]
pub const fn physics_to_render_quat(q: Quaternion) -> Quaternion {
    Quaternion::new(q.x, q.z, -q.y, q.w)
}

/// Converts a rendering-space orientation to physics space.
#[inline]
#[must_use]
pub const fn render_to_physics_quat(q: Quaternion) -> Quaternion {
    Quaternion::new(q.x, -q.z, q.y, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 7] = [0.0, -0.0, 1.0, -2.5, 0.1, 1e-300, f64::MAX];

    #[test]
    fn test_position_round_trip_is_exact() {
        for &x in &SAMPLES {
            for &y in &SAMPLES {
                for &z in &SAMPLES {
                    let v = Vec3::new(x, y, z);
                    let back = render_to_physics(physics_to_render(v));
                    assert_eq!(back.x.to_bits(), v.x.to_bits());
                    assert_eq!(back.y.to_bits(), v.y.to_bits());
                    assert_eq!(back.z.to_bits(), v.z.to_bits());

                    let back = physics_to_render(render_to_physics(v));
                    assert_eq!(back, v);
                }
            }
        }
    }

    #[test]
    fn test_quaternion_round_trip_is_exact() {
        let q = Quaternion::new(0.1, -0.2, 0.3, 0.9);
        assert_eq!(render_to_physics_quat(physics_to_render_quat(q)), q);
        assert_eq!(physics_to_render_quat(render_to_physics_quat(q)), q);
    }

    #[test]
    fn test_physics_up_is_render_up() {
        assert_eq!(physics_to_render(Vec3::Z), Vec3::Y);
        assert_eq!(render_to_physics(Vec3::Y), Vec3::Z);
        assert_eq!(physics_to_render(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, -2.0));
    }

    #[test]
    fn test_rotation_commutes_with_conversion() {
        // 90 degrees about physics Z (yaw) is 90 degrees about render Y.
        let half = std::f64::consts::FRAC_PI_4;
        let yaw = Quaternion::new(0.0, 0.0, half.sin(), half.cos());
        let p = Vec3::new(1.0, 0.5, -0.25);

        let rotated_then_converted = physics_to_render(yaw.rotate(p));
        let converted_then_rotated = physics_to_render_quat(yaw).rotate(physics_to_render(p));
        assert!(rotated_then_converted.distance(converted_then_rotated) < 1e-12);
    }
}
