//! Force accumulation and semi-implicit Euler integration.

use glam::Vec3;

use crate::object::PhysicalObject;

/// Sets the force for the coming tick.
///
/// The launch impulse is consumed on the first call. Friction from the
/// last surface, if pending, opposes the current velocity once.
pub fn compute_forces(object: &mut PhysicalObject, gravity: f32) {
    object.force = object.initial_force;
    object.force.z -= gravity;
    object.initial_force = Vec3::ZERO;

    if object.apply_friction {
        object.force += object.velocity * -object.friction;
        object.apply_friction = false;
    }
}

/// Advances the object by one sub-step.
///
/// Position moves with the old velocity, then velocity picks up
/// `force * dt / force_time_base`. Returns true when the vertical velocity
/// turned from rising (or level) to falling during this sub-step.
pub fn integrate(object: &mut PhysicalObject, dt: f32, force_time_base: f32) -> bool {
    object.old_position = object.position;
    object.old_velocity = object.velocity;

    object.position += object.velocity * dt;

    if object.probe.target_pending {
        object.probe.target_position = object.position;
    }

    object.velocity += object.force * (dt / force_time_base);

    object.old_velocity.z >= 0.0 && object.velocity.z < 0.0
}
