//! Force and acceleration contributions.
//!
//! Every function here is pure: state and parameters in, contribution out.

use crate::vector::normalize_or_zero2;
use nalgebra::{SVector, Vector2};

/// Gravity used for friction normal force, independent of any gravity slider.
pub const STANDARD_GRAVITY: f64 = 9.81;
/// Below this speed a frictionally braked body is considered stopped (m/s).
pub const REST_SPEED_EPSILON: f64 = 0.01;

/// Vertical velocity after one step of constant downward gravity.
pub fn apply_gravity(vy: f64, g: f64, dt: f64) -> f64 {
    vy - g * dt
}

/// Per-step velocity multiplier for the demos' linear drag.
///
/// This is the discretised `(1 - c dt)` factor, not an exponential decay.
pub fn drag_factor(coefficient: f64, dt: f64) -> f64 {
    1.0 - coefficient * dt
}

/// Scale every velocity component by the drag factor, when drag is on.
pub fn apply_linear_drag<const N: usize>(v: &mut SVector<f64, N>, coefficient: f64, dt: f64) {
    if coefficient > 0.0 {
        *v *= drag_factor(coefficient, dt);
    }
}

/// Viscous force `-c v`.
pub fn viscous_force(velocity: &Vector2<f64>, coefficient: f64) -> Vector2<f64> {
    -coefficient * velocity
}

/// Hookean force on a mass at `position` from a spring fixed at `anchor`.
///
/// Positive stretch pulls the mass toward the anchor. Coincident points give
/// no direction and therefore no force.
pub fn hooke_force(
    position: &Vector2<f64>,
    anchor: &Vector2<f64>,
    stiffness: f64,
    rest_length: f64,
) -> Vector2<f64> {
    let to_anchor = anchor - position;
    let dist = to_anchor.norm();
    let magnitude = stiffness * (dist - rest_length);
    normalize_or_zero2(&to_anchor) * magnitude
}

/// Sign that is zero at zero, matching how the demos read a direction of travel.
pub fn sign_or_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Coulomb friction `μ m g` opposing the current velocity; zero at rest.
pub fn coulomb_friction(velocity: f64, coefficient: f64, mass: f64) -> f64 {
    -sign_or_zero(velocity) * coefficient * mass * STANDARD_GRAVITY
}

/// Direction a driving force pushes: along the velocity, or toward negative
/// x when the body is at rest.
pub fn drive_direction(velocity: f64) -> f64 {
    if velocity > 0.0 { 1.0 } else { -1.0 }
}

/// Net acceleration from a driving force plus opposing friction.
pub fn driven_acceleration(velocity: f64, force: f64, friction: f64, mass: f64) -> f64 {
    if mass <= 0.0 {
        return 0.0;
    }
    let applied = force * drive_direction(velocity);
    (applied + coulomb_friction(velocity, friction, mass)) / mass
}

/// Advance a driven, frictional 1D velocity by one step, snapping to rest
/// below [`REST_SPEED_EPSILON`]. Returns `(velocity, acceleration)`.
pub fn step_driven_velocity(
    velocity: f64,
    force: f64,
    friction: f64,
    mass: f64,
    dt: f64,
) -> (f64, f64) {
    let a = driven_acceleration(velocity, force, friction, mass);
    let mut v = velocity + a * dt;
    if v.abs() < REST_SPEED_EPSILON {
        v = 0.0;
    }
    (v, a)
}
