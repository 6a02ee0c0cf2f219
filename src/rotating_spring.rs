//! Spring anchored at the origin and swung around it at a prescribed rate.
//!
//! The length is not integrated from forces. It relaxes toward the analytic
//! equilibrium where the spring force balances the centrifugal pull,
//! `k (L - L0) = m ω² L`, which has no positive solution once `ω ≥ √(k/m)`.

use crate::energy;
use crate::error::{EngineError, Result};
use crate::vector::polar2;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

pub const DEFAULT_ANGULAR_SPEED: f64 = 2.0;
pub const DEFAULT_STIFFNESS: f64 = 5.0;
pub const DEFAULT_REST_LENGTH: f64 = 5.0;
pub const DEFAULT_MASS: f64 = 1.0;

/// Requested angular speeds are capped at this fraction of the critical one.
pub const MAX_SPEED_FRACTION: f64 = 0.99;
/// A broken spring is drawn at this multiple of its rest length.
pub const BROKEN_STRETCH: f64 = 10.0;
/// Relaxation rate is `BASE + GAIN ω²` per second.
pub const RELAXATION_BASE: f64 = 0.3;
pub const RELAXATION_GAIN: f64 = 0.5;
/// Safety factor reported while the spring is not rotating.
pub const AT_REST_SAFETY_FACTOR: f64 = 999.0;
pub const CAUTION_SAFETY_FACTOR: f64 = 1.5;
pub const DANGER_SAFETY_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatingSpringParams {
    /// Prescribed rotation rate (rad/s).
    pub angular_speed: f64,
    pub stiffness: f64,
    pub rest_length: f64,
    pub mass: f64,
}

impl Default for RotatingSpringParams {
    fn default() -> Self {
        Self {
            angular_speed: DEFAULT_ANGULAR_SPEED,
            stiffness: DEFAULT_STIFFNESS,
            rest_length: DEFAULT_REST_LENGTH,
            mass: DEFAULT_MASS,
        }
    }
}

impl RotatingSpringParams {
    pub fn critical_speed(&self) -> f64 {
        critical_speed(self.stiffness, self.mass)
    }

    pub fn would_break(&self) -> bool {
        self.angular_speed > 0.0 && self.angular_speed >= self.critical_speed()
    }
}

/// `√(k/m)`; a massless bob never breaks the spring.
pub fn critical_speed(stiffness: f64, mass: f64) -> f64 {
    if mass <= 0.0 {
        return f64::INFINITY;
    }
    (stiffness.max(0.0) / mass).sqrt()
}

/// Largest angular speed the control panel accepts for a given spring.
pub fn clamp_angular_speed(requested: f64, stiffness: f64, mass: f64) -> f64 {
    let cap = MAX_SPEED_FRACTION * critical_speed(stiffness, mass);
    requested.max(0.0).min(cap)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Equilibrium {
    Stable(f64),
    Broken,
}

/// Length at which the spring balances the centrifugal pull.
pub fn equilibrium(params: &RotatingSpringParams) -> Equilibrium {
    let RotatingSpringParams {
        angular_speed: w,
        stiffness: k,
        rest_length: l0,
        mass: m,
    } = *params;
    if w == 0.0 {
        return Equilibrium::Stable(l0);
    }
    if params.would_break() {
        return Equilibrium::Broken;
    }
    let denominator = k - m * w * w;
    if denominator <= 0.0 {
        return Equilibrium::Broken;
    }
    let target = k * l0 / denominator;
    if !target.is_finite() {
        return Equilibrium::Broken;
    }
    Equilibrium::Stable(target.max(l0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SafetyLevel {
    Safe,
    Caution,
    Danger,
}

impl SafetyLevel {
    pub fn from_factor(factor: f64) -> Self {
        if factor < DANGER_SAFETY_FACTOR {
            SafetyLevel::Danger
        } else if factor < CAUTION_SAFETY_FACTOR {
            SafetyLevel::Caution
        } else {
            SafetyLevel::Safe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SafetyLevel::Safe => "SAFE",
            SafetyLevel::Caution => "CAUTION",
            SafetyLevel::Danger => "APPROACHING LIMIT",
        }
    }
}

/// Force, motion and energy readout for the stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpringAnalysis {
    pub length: f64,
    pub stretch: f64,
    pub spring_force: f64,
    pub centrifugal_force: f64,
    pub tangential_velocity: f64,
    pub angle_deg: f64,
    pub kinetic: f64,
    pub spring_potential: f64,
    pub total: f64,
    pub critical_speed: f64,
    pub safety_factor: f64,
    pub safety: SafetyLevel,
    pub percent_of_critical: f64,
    pub will_break: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotatingSpring {
    /// Rotation angle in `[0, 2π)`.
    pub angle: f64,
    pub length: f64,
    target: f64,
    broken: bool,
}

impl RotatingSpring {
    pub fn new(params: &RotatingSpringParams) -> Self {
        let mut spring = Self {
            angle: 0.0,
            length: params.rest_length,
            target: params.rest_length,
            broken: false,
        };
        spring.update_target(params);
        spring
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Recompute the relaxation target after any parameter change. Returns
    /// true when this call is the one that breaks the spring.
    pub fn update_target(&mut self, params: &RotatingSpringParams) -> bool {
        let was_broken = self.broken;
        match equilibrium(params) {
            Equilibrium::Stable(target) => {
                self.target = target;
                self.broken = false;
            }
            Equilibrium::Broken => {
                self.target = BROKEN_STRETCH * params.rest_length;
                self.broken = true;
                if !was_broken {
                    log::warn!(
                        "spring broke at {:.2} rad/s (critical {:.2} rad/s)",
                        params.angular_speed,
                        params.critical_speed()
                    );
                }
            }
        }
        self.broken && !was_broken
    }

    /// Back to angle zero at rest length, with the target recomputed.
    pub fn reset(&mut self, params: &RotatingSpringParams) {
        self.angle = 0.0;
        self.length = params.rest_length;
        self.update_target(params);
    }

    /// Refuse to start rotating a spring that cannot hold.
    pub fn check_can_run(params: &RotatingSpringParams) -> Result<()> {
        if params.would_break() {
            return Err(EngineError::WouldBreak {
                critical: params.critical_speed(),
            });
        }
        Ok(())
    }

    /// Relax the length toward the target and advance the angle. A broken
    /// spring does not move.
    pub fn step(&mut self, params: &RotatingSpringParams, dt: f64) {
        if self.broken || dt <= 0.0 {
            return;
        }
        let w = params.angular_speed;
        let rate = RELAXATION_BASE + RELAXATION_GAIN * w * w;
        // never step past the target
        let blend = (rate * dt).min(1.0);
        self.length += (self.target - self.length) * blend;
        self.angle = (self.angle + w * dt).rem_euclid(TAU);
    }

    pub fn bob_position(&self) -> Vector2<f64> {
        polar2(&Vector2::zeros(), self.length, self.angle)
    }

    pub fn analysis(&self, params: &RotatingSpringParams) -> SpringAnalysis {
        let w = params.angular_speed;
        let stretch = self.length - params.rest_length;
        let tangential_velocity = self.length * w;
        let kinetic = energy::kinetic(params.mass, tangential_velocity);
        let spring_potential =
            energy::spring_potential(params.stiffness, self.length, params.rest_length);
        let critical = params.critical_speed();
        let safety_factor = if w > 0.0 {
            critical / w
        } else {
            AT_REST_SAFETY_FACTOR
        };
        let percent_of_critical = if critical > 0.0 && critical.is_finite() {
            100.0 * w / critical
        } else {
            0.0
        };
        SpringAnalysis {
            length: self.length,
            stretch,
            spring_force: params.stiffness * stretch,
            centrifugal_force: params.mass * w * w * self.length,
            tangential_velocity,
            angle_deg: self.angle.to_degrees(),
            kinetic,
            spring_potential,
            total: kinetic + spring_potential,
            critical_speed: critical,
            safety_factor,
            safety: SafetyLevel::from_factor(safety_factor),
            percent_of_critical,
            will_break: w > 0.0 && params.stiffness - params.mass * w * w <= 0.0,
        }
    }
}
