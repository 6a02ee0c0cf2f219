//! One-dimensional block collisions against a wall and each other.
//!
//! Positions and sizes are in pixels along the ground line, velocities in m/s;
//! [`PIXELS_PER_METER`] converts between them when positions advance.

use crate::energy;
use serde::{Deserialize, Serialize};

pub const PIXELS_PER_METER: f64 = 100.0;
/// Mass per unit block area (kg / px²).
pub const DENSITY: f64 = 1.0;
pub const MASS_TO_SIZE_SCALE: f64 = 10.0;
/// Clearance left between a block and the wall after a bounce (px).
pub const WALL_CLEARANCE: f64 = 0.5;
/// Gap left between two blocks after they are pulled apart (px).
pub const SEPARATION_GAP: f64 = 0.01;

/// Side length in pixels of a square block of the given mass.
pub fn mass_to_size(mass: f64) -> f64 {
    (mass.max(0.0) / DENSITY).sqrt() * MASS_TO_SIZE_SCALE
}

/// Post-collision velocities of a 1D elastic collision.
///
/// Two massless bodies have nothing to exchange and keep their velocities.
pub fn elastic_exchange(m1: f64, v1: f64, m2: f64, v2: f64) -> (f64, f64) {
    let total = m1 + m2;
    if total <= 0.0 {
        return (v1, v2);
    }
    let v1_new = ((m1 - m2) * v1 + 2.0 * m2 * v2) / total;
    let v2_new = ((m2 - m1) * v2 + 2.0 * m1 * v1) / total;
    (v1_new, v2_new)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Centre position (px).
    pub x: f64,
    /// Velocity (m/s).
    pub v: f64,
    /// Last applied acceleration (m/s²).
    pub a: f64,
    pub mass: f64,
}

impl Block {
    pub fn new(x: f64, v: f64, mass: f64) -> Self {
        Self { x, v, a: 0.0, mass }
    }

    pub fn size(&self) -> f64 {
        mass_to_size(self.mass)
    }

    pub fn half_width(&self) -> f64 {
        0.5 * self.size()
    }

    pub fn left(&self) -> f64 {
        self.x - self.half_width()
    }

    pub fn right(&self) -> f64 {
        self.x + self.half_width()
    }

    pub fn kinetic_energy(&self) -> f64 {
        energy::kinetic(self.mass, self.v)
    }

    pub fn momentum(&self) -> f64 {
        self.mass * self.v
    }

    fn advance(&mut self, dt: f64) {
        self.x += self.v * PIXELS_PER_METER * dt;
    }

    /// Push the block out of the wall, bouncing it only if it was moving
    /// into the wall. Returns whether a bounce happened.
    fn resolve_wall(&mut self, wall: f64) -> bool {
        if self.left() > wall {
            return false;
        }
        self.x = wall + self.half_width() + WALL_CLEARANCE;
        if self.v < 0.0 {
            self.v = -self.v;
            true
        } else {
            false
        }
    }
}

/// Boundaries of the ground strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Inner face of the left wall (px).
    pub wall: f64,
    /// Right edge of the world (px).
    pub far: f64,
}

/// What happened during one resolution step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepEvents {
    pub wall_bounces: u32,
    pub block_collisions: u32,
    /// The stationary block reached the far boundary moving outward.
    pub far_stop: bool,
}

/// A moving block, a stationary block and the wall they bounce between.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionPair {
    pub moving: Block,
    pub stationary: Block,
    pub bounds: Bounds,
    collisions: u64,
}

impl CollisionPair {
    pub fn new(moving: Block, stationary: Block, bounds: Bounds) -> Self {
        Self {
            moving,
            stationary,
            bounds,
            collisions: 0,
        }
    }

    pub fn collision_count(&self) -> u64 {
        self.collisions
    }

    pub fn overlapping(&self) -> bool {
        self.moving.right() >= self.stationary.left()
            && self.moving.left() <= self.stationary.right()
    }

    pub fn total_momentum(&self) -> f64 {
        energy::momentum([
            (self.moving.mass, self.moving.v),
            (self.stationary.mass, self.stationary.v),
        ])
    }

    pub fn total_kinetic(&self) -> f64 {
        self.moving.kinetic_energy() + self.stationary.kinetic_energy()
    }

    /// Advance positions by `dt` and resolve every contact that results.
    ///
    /// Order: positions move first, then wall contacts, then the block pair,
    /// then the world bounds for the stationary block.
    pub fn step(&mut self, dt: f64) -> StepEvents {
        let mut events = StepEvents::default();

        self.moving.advance(dt);
        self.stationary.advance(dt);

        let wall = self.bounds.wall;
        if self.moving.resolve_wall(wall) {
            events.wall_bounces += 1;
        }
        if self.stationary.resolve_wall(wall) {
            events.wall_bounces += 1;
        }

        if self.overlapping() {
            let (v1, v2) = elastic_exchange(
                self.moving.mass,
                self.moving.v,
                self.stationary.mass,
                self.stationary.v,
            );
            self.moving.v = v1;
            self.stationary.v = v2;
            events.block_collisions += 1;
            self.separate();
        }

        events.far_stop = self.clamp_stationary();

        self.collisions += u64::from(events.wall_bounces + events.block_collisions);
        events
    }

    /// Place the moving block flush against the stationary one, on whichever
    /// side its centre currently is.
    fn separate(&mut self) {
        let half = self.moving.half_width();
        if self.moving.x < self.stationary.x {
            self.moving.x = self.stationary.left() - half - SEPARATION_GAP;
        } else {
            self.moving.x = self.stationary.right() + half + SEPARATION_GAP;
        }
    }

    fn clamp_stationary(&mut self) -> bool {
        let half = self.stationary.half_width();
        if self.stationary.left() < self.bounds.wall {
            self.stationary.x = self.bounds.wall + half;
        }
        if self.stationary.right() > self.bounds.far {
            self.stationary.x = self.bounds.far - half;
            if self.stationary.v > 0.0 {
                self.stationary.v = 0.0;
                return true;
            }
        }
        false
    }
}
