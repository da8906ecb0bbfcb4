//! Small vector helpers on top of `glam`.

use glam::{Vec2, Vec3};
use lobber_common::HEIGHT_UNITS;

/// Impulse that bounces `incoming` off a surface with the given normal.
///
/// `restitution` of 1 cancels the normal component; anything above that
/// reflects part of it back.
#[must_use]
pub fn bounce_impulse(incoming: Vec3, normal: Vec3, restitution: f32) -> Vec3 {
    normal * (-restitution * incoming.dot(normal))
}

/// Unit vector pointing away from the horizontal direction of travel.
#[must_use]
pub fn reversed_incidence(delta: Vec3) -> Vec3 {
    -Vec3::new(delta.x, delta.y, 0.0).normalize_or_zero()
}

/// Launch force vector for a horizontal heading, elevation and magnitude.
///
/// The heading is normalised in the plane and the elevation contributes
/// `sin(angle)` vertically without renormalising, so the horizontal part
/// always carries the full magnitude.
#[must_use]
pub fn aim(from: Vec2, to: Vec2, angle: f32, magnitude: f32) -> Vec3 {
    let heading = (to - from).normalize_or_zero();
    Vec3::new(heading.x, heading.y, angle.sin()) * magnitude
}

/// Planar distance between two positions.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Converts a launch force from vertical units to world units horizontally.
#[must_use]
pub fn scale_launch_force(force: Vec3, cell_size: f32, scale: f32) -> Vec3 {
    let horizontal = cell_size / HEIGHT_UNITS;
    Vec3::new(force.x * horizontal, force.y * horizontal, force.z) * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_bounce_keeps_thirty_percent() {
        let incoming = Vec3::new(3.0, 0.0, -10.0);
        let impulse = bounce_impulse(incoming, Vec3::NEG_Z, 1.3);
        let out = incoming + impulse;
        assert!((out.z - 3.0).abs() < 1e-5);
        assert!((out.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounce_ignores_normal_sign() {
        let incoming = Vec3::new(1.0, 2.0, -4.0);
        let up = bounce_impulse(incoming, Vec3::Z, 1.2);
        let down = bounce_impulse(incoming, Vec3::NEG_Z, 1.2);
        assert!((up - down).length() < 1e-6);
    }

    #[test]
    fn test_aim_keeps_full_horizontal_magnitude() {
        let force = aim(Vec2::new(5.0, 5.0), Vec2::new(35.0, 5.0), 0.5, 100.0);
        assert!((force.x - 100.0).abs() < 1e-4);
        assert!(force.y.abs() < 1e-6);
        assert!((force.z - 0.5f32.sin() * 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_reversed_incidence() {
        let normal = reversed_incidence(Vec3::new(0.0, 4.0, -3.0));
        assert!((normal - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-6);
        assert_eq!(reversed_incidence(Vec3::new(0.0, 0.0, -1.0)), Vec3::ZERO);
    }
}
