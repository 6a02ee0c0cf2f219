//! A point mass held by up to three anchored springs.

use crate::energy;
use crate::error::{EngineError, Result};
use crate::forces::{hooke_force, viscous_force};
use crate::integrator::step_velocity_first;
use crate::vector::magnitude2;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

pub const MAX_SPRINGS: usize = 3;

pub const DEFAULT_STIFFNESS: f64 = 1.0;
pub const DEFAULT_REST_LENGTH: f64 = 5.0;
pub const DEFAULT_MASS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub anchor: Vector2<f64>,
    pub stiffness: f64,
    pub rest_length: f64,
    pub enabled: bool,
}

impl Spring {
    pub fn new(anchor: Vector2<f64>, enabled: bool) -> Self {
        Self {
            anchor,
            stiffness: DEFAULT_STIFFNESS,
            rest_length: DEFAULT_REST_LENGTH,
            enabled,
        }
    }

    pub fn length_to(&self, position: &Vector2<f64>) -> f64 {
        magnitude2(&(self.anchor - position))
    }

    pub fn force_on(&self, position: &Vector2<f64>) -> Vector2<f64> {
        hooke_force(position, &self.anchor, self.stiffness, self.rest_length)
    }

    pub fn potential_at(&self, position: &Vector2<f64>) -> f64 {
        energy::spring_potential(self.stiffness, self.length_to(position), self.rest_length)
    }
}

/// Default layout: right, left and top anchors, only the first attached.
pub fn default_springs() -> [Spring; MAX_SPRINGS] {
    [
        Spring::new(Vector2::new(5.0, 0.0), true),
        Spring::new(Vector2::new(-5.0, 0.0), false),
        Spring::new(Vector2::new(0.0, 5.0), false),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpringSet {
    springs: [Spring; MAX_SPRINGS],
    pub mass: f64,
    pub position: Vector2<f64>,
    pub velocity: Vector2<f64>,
    /// Viscous coefficient of the surrounding air.
    pub air_resistance: f64,
}

impl Default for SpringSet {
    fn default() -> Self {
        Self::new(default_springs(), DEFAULT_MASS)
    }
}

impl SpringSet {
    pub fn new(springs: [Spring; MAX_SPRINGS], mass: f64) -> Self {
        Self {
            springs,
            mass,
            position: Vector2::zeros(),
            velocity: Vector2::zeros(),
            air_resistance: 0.0,
        }
    }

    pub fn springs(&self) -> &[Spring; MAX_SPRINGS] {
        &self.springs
    }

    pub fn spring_mut(&mut self, index: usize) -> Result<&mut Spring> {
        self.springs
            .get_mut(index)
            .ok_or(EngineError::NoSuchSpring(index + 1))
    }

    pub fn active(&self) -> impl Iterator<Item = &Spring> {
        self.springs.iter().filter(|s| s.enabled)
    }

    /// Mass back at the origin, at rest. Springs keep their settings.
    pub fn reset(&mut self) {
        self.position = Vector2::zeros();
        self.velocity = Vector2::zeros();
    }

    /// Sum of spring forces and air resistance at a given state.
    pub fn net_force(&self, position: &Vector2<f64>, velocity: &Vector2<f64>) -> Vector2<f64> {
        let springs: Vector2<f64> = self.active().map(|s| s.force_on(position)).sum();
        springs + viscous_force(velocity, self.air_resistance)
    }

    pub fn acceleration(&self, position: &Vector2<f64>, velocity: &Vector2<f64>) -> Vector2<f64> {
        if self.mass <= 0.0 {
            return Vector2::zeros();
        }
        self.net_force(position, velocity) / self.mass
    }

    /// One velocity-first Euler step.
    pub fn step(&mut self, dt: f64) -> Vector2<f64> {
        let mut x = self.position;
        let mut v = self.velocity;
        let a = step_velocity_first(&mut x, &mut v, |x, v| self.acceleration(x, v), dt);
        self.position = x;
        self.velocity = v;
        a
    }

    pub fn kinetic(&self) -> f64 {
        energy::kinetic(self.mass, magnitude2(&self.velocity))
    }

    pub fn potential(&self) -> f64 {
        self.active().map(|s| s.potential_at(&self.position)).sum()
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic() + self.potential()
    }
}
