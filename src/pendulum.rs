//! Single, double and triple pendulum dynamics.
//!
//! A chain has three fixed slots. Slot 0 hangs from the origin and is always
//! enabled; slot i hangs from the bob of slot i-1 and may only be enabled
//! while every earlier slot is.
//!
//! Two modes:
//! - simple: every enabled segment swings as an independent single
//!   pendulum, advanced with velocity-first Euler;
//! - real physics: the coupled double-pendulum equations (applied pairwise
//!   for three segments), advanced with RK4.

use crate::energy;
use crate::error::{EngineError, Result};
use crate::integrator::step_rk4;
use nalgebra::{SVector, Vector2};
use serde::{Deserialize, Serialize};

pub const MAX_SEGMENTS: usize = 3;

pub const DEFAULT_START_ANGLE_DEG: f64 = 45.0;
pub const DEFAULT_LENGTH: f64 = 10.0;
pub const DEFAULT_MASS: f64 = 1.0;

/// `[θ1, θ2, θ3, ω1, ω2, ω3]`
pub type ChainState = SVector<f64, 6>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Angle from the downward vertical (rad).
    pub theta: f64,
    pub omega: f64,
    /// Angular acceleration applied on the last step.
    pub alpha: f64,
    pub length: f64,
    pub mass: f64,
    pub enabled: bool,
}

impl Segment {
    pub fn at_rest(theta: f64, length: f64, mass: f64) -> Self {
        Self {
            theta,
            omega: 0.0,
            alpha: 0.0,
            length,
            mass,
            enabled: false,
        }
    }

    /// Linear speed of the bob relative to its own pivot.
    pub fn bob_speed(&self) -> f64 {
        energy::bob_speed(self.length, self.omega)
    }

    pub fn kinetic(&self) -> f64 {
        energy::kinetic(self.mass, self.bob_speed())
    }

    pub fn potential(&self, g: f64) -> f64 {
        energy::pendulum_potential(self.mass, g, self.length, self.theta)
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::at_rest(
            DEFAULT_START_ANGLE_DEG.to_radians(),
            DEFAULT_LENGTH,
            DEFAULT_MASS,
        )
    }
}

/// `α = -(g/L) sin θ - damping ω`; a zero-length rod feels no restoring torque.
pub fn single_alpha(theta: f64, omega: f64, length: f64, g: f64, damping: f64) -> f64 {
    let restoring = if length > 0.0 {
        -(g / length) * theta.sin()
    } else {
        0.0
    };
    restoring - damping * omega
}

/// Angular accelerations of an ideal double pendulum (upper = 1, lower = 2),
/// each with linear damping.
#[allow(clippy::too_many_arguments)]
pub fn double_alpha(
    theta1: f64,
    theta2: f64,
    omega1: f64,
    omega2: f64,
    l1: f64,
    l2: f64,
    m1: f64,
    m2: f64,
    g: f64,
    damping: f64,
) -> (f64, f64) {
    let delta = theta1 - theta2;
    let den = 2.0 * m1 + m2 - m2 * (2.0 * delta).cos();

    let den1 = l1 * den;
    let a1 = if den1.abs() > 1e-12 {
        (-g * (2.0 * m1 + m2) * theta1.sin()
            - m2 * g * (theta1 - 2.0 * theta2).sin()
            - 2.0 * delta.sin() * m2 * (omega2 * omega2 * l2 + omega1 * omega1 * l1 * delta.cos()))
            / den1
    } else {
        0.0
    };

    let den2 = l2 * den;
    let a2 = if den2.abs() > 1e-12 {
        (2.0 * delta.sin()
            * (omega1 * omega1 * l1 * (m1 + m2)
                + g * (m1 + m2) * theta1.cos()
                + omega2 * omega2 * l2 * m2 * delta.cos()))
            / den2
    } else {
        0.0
    };

    (a1 - damping * omega1, a2 - damping * omega2)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    pub gravity: f64,
    /// Viscous damping on every segment (1/s).
    pub damping: f64,
    pub real_physics: bool,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            damping: 0.0,
            real_physics: false,
        }
    }
}

/// Per-segment readout for the stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentStats {
    pub index: usize,
    pub theta_deg: f64,
    pub omega: f64,
    pub alpha: f64,
    pub speed: f64,
    pub potential: f64,
    pub kinetic: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendulumChain {
    segments: [Segment; MAX_SEGMENTS],
}

impl Default for PendulumChain {
    fn default() -> Self {
        Self::new([Segment::default(); MAX_SEGMENTS])
    }
}

impl PendulumChain {
    /// Build a chain from three slots; slot 0 is forced on and the enabled
    /// flags of the rest are made contiguous.
    pub fn new(mut segments: [Segment; MAX_SEGMENTS]) -> Self {
        segments[0].enabled = true;
        for i in 1..MAX_SEGMENTS {
            if !segments[i - 1].enabled {
                segments[i].enabled = false;
            }
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment; MAX_SEGMENTS] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Result<&Segment> {
        self.segments
            .get(index)
            .ok_or(EngineError::NoSuchSegment(index + 1))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().take_while(|s| s.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// Enable slot `index`. The slot before it must already be enabled.
    pub fn enable(&mut self, index: usize) -> Result<()> {
        if index >= MAX_SEGMENTS {
            return Err(EngineError::NoSuchSegment(index + 1));
        }
        if index > 0 && !self.segments[index - 1].enabled {
            return Err(EngineError::SegmentOrder {
                segment: index + 1,
                required: index,
            });
        }
        self.segments[index].enabled = true;
        log::debug!("pendulum segment {} enabled", index + 1);
        Ok(())
    }

    /// Disable slot `index` and every slot after it.
    pub fn disable(&mut self, index: usize) -> Result<()> {
        if index >= MAX_SEGMENTS {
            return Err(EngineError::NoSuchSegment(index + 1));
        }
        if index == 0 {
            return Err(EngineError::Unsupported("pendulum"));
        }
        for s in self.segments[index..].iter_mut() {
            s.enabled = false;
        }
        log::debug!("pendulum segments {}..={} disabled", index + 1, MAX_SEGMENTS);
        Ok(())
    }

    /// Move a segment to a new start angle, at rest.
    pub fn set_start_angle(&mut self, index: usize, theta: f64) -> Result<()> {
        let s = self
            .segments
            .get_mut(index)
            .ok_or(EngineError::NoSuchSegment(index + 1))?;
        s.theta = theta;
        s.omega = 0.0;
        s.alpha = 0.0;
        Ok(())
    }

    /// Every enabled segment back to its entry in `angles`, at rest.
    pub fn restart(&mut self, angles: &[f64; MAX_SEGMENTS]) {
        for (s, &theta) in self.segments.iter_mut().zip(angles).take_while(|(s, _)| s.enabled) {
            s.theta = theta;
            s.omega = 0.0;
            s.alpha = 0.0;
        }
    }

    pub fn set_length(&mut self, index: usize, length: f64) -> Result<()> {
        self.segments
            .get_mut(index)
            .ok_or(EngineError::NoSuchSegment(index + 1))?
            .length = length;
        Ok(())
    }

    pub fn set_mass(&mut self, index: usize, mass: f64) -> Result<()> {
        self.segments
            .get_mut(index)
            .ok_or(EngineError::NoSuchSegment(index + 1))?
            .mass = mass;
        Ok(())
    }

    pub fn state(&self) -> ChainState {
        let s = &self.segments;
        ChainState::from_row_slice(&[
            s[0].theta, s[1].theta, s[2].theta, s[0].omega, s[1].omega, s[2].omega,
        ])
    }

    fn store(&mut self, state: &ChainState, alphas: &[f64; MAX_SEGMENTS]) {
        for (i, s) in self.segments.iter_mut().enumerate() {
            if s.enabled {
                s.theta = state[i];
                s.omega = state[MAX_SEGMENTS + i];
                s.alpha = alphas[i];
            }
        }
    }

    /// Coupled angular accelerations for the enabled segments at `state`.
    ///
    /// Three segments use the double-pendulum formula twice: (1, 2) gives
    /// α1 and α2, (2, 3) gives α3.
    pub fn coupled_alphas(&self, state: &ChainState, params: &PendulumParams) -> [f64; MAX_SEGMENTS] {
        let g = params.gravity;
        let d = params.damping;
        let s = &self.segments;
        let th = |i: usize| state[i];
        let om = |i: usize| state[MAX_SEGMENTS + i];
        let mut out = [0.0; MAX_SEGMENTS];

        match self.enabled_count() {
            1 => {
                out[0] = single_alpha(th(0), om(0), s[0].length, g, d);
            }
            2 => {
                let (a1, a2) = double_alpha(
                    th(0), th(1), om(0), om(1), s[0].length, s[1].length, s[0].mass, s[1].mass, g, d,
                );
                out[0] = a1;
                out[1] = a2;
            }
            _ => {
                let (a1, a2) = double_alpha(
                    th(0), th(1), om(0), om(1), s[0].length, s[1].length, s[0].mass, s[1].mass, g, d,
                );
                let (_, a3) = double_alpha(
                    th(1), th(2), om(1), om(2), s[1].length, s[2].length, s[1].mass, s[2].mass, g, d,
                );
                out = [a1, a2, a3];
            }
        }
        out
    }

    fn simple_alphas(&self, params: &PendulumParams) -> [f64; MAX_SEGMENTS] {
        let mut out = [0.0; MAX_SEGMENTS];
        for (i, s) in self.enabled().enumerate() {
            out[i] = single_alpha(s.theta, s.omega, s.length, params.gravity, params.damping);
        }
        out
    }

    /// Advance every enabled segment by `dt`.
    pub fn step(&mut self, params: &PendulumParams, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        if params.real_physics {
            let start = self.state();
            let alphas = self.coupled_alphas(&start, params);
            let n = self.enabled_count();
            let f = |y: &ChainState| {
                let a = self.coupled_alphas(y, params);
                let mut dy = ChainState::zeros();
                for i in 0..n {
                    dy[i] = y[MAX_SEGMENTS + i];
                    dy[MAX_SEGMENTS + i] = a[i];
                }
                dy
            };
            let next = step_rk4(&start, &f, dt);
            self.store(&next, &alphas);
        } else {
            let alphas = self.simple_alphas(params);
            for (s, a) in self.segments.iter_mut().zip(alphas) {
                if !s.enabled {
                    continue;
                }
                s.alpha = a;
                s.omega += a * dt;
                s.theta += s.omega * dt;
            }
        }
    }

    /// Bob positions of the enabled segments, each measured from the origin.
    pub fn bob_positions(&self) -> Vec<Vector2<f64>> {
        let mut pivot = Vector2::zeros();
        self.enabled()
            .map(|s| {
                pivot += Vector2::new(s.length * s.theta.sin(), -s.length * s.theta.cos());
                pivot
            })
            .collect()
    }

    pub fn segment_stats(&self, g: f64) -> Vec<SegmentStats> {
        self.enabled()
            .enumerate()
            .map(|(index, s)| {
                let potential = s.potential(g);
                let kinetic = s.kinetic();
                SegmentStats {
                    index,
                    theta_deg: s.theta.to_degrees(),
                    omega: s.omega,
                    alpha: s.alpha,
                    speed: s.bob_speed(),
                    potential,
                    kinetic,
                    total: potential + kinetic,
                }
            })
            .collect()
    }

    /// Sum of the per-segment energies shown on the stats panel.
    pub fn display_energy(&self, g: f64) -> f64 {
        self.enabled().map(|s| s.kinetic() + s.potential(g)).sum()
    }

    /// Mechanical energy of the chain as one coupled system: bob velocities
    /// accumulate down the chain and heights are measured from the lowest
    /// reachable point of each bob.
    pub fn chain_energy(&self, g: f64) -> f64 {
        let mut vel = Vector2::<f64>::zeros();
        let mut y = 0.0;
        let mut reach = 0.0;
        let mut total = 0.0;
        for s in self.enabled() {
            let (sin, cos) = s.theta.sin_cos();
            vel += Vector2::new(s.length * s.omega * cos, s.length * s.omega * sin);
            y -= s.length * cos;
            reach += s.length;
            total += energy::kinetic(s.mass, vel.norm()) + s.mass * g * (y + reach);
        }
        total
    }
}
