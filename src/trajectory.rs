//! Precomputed ballistic trajectories for scrub-style playback.

use crate::energy;
use crate::forces::{apply_gravity, apply_linear_drag};
use crate::vector::magnitude3;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Fixed sampling step of a precomputed trajectory (s).
pub const TRAJECTORY_DT: f64 = 0.1;
/// Hard cap on integration steps (100 s simulated at [`TRAJECTORY_DT`]).
pub const MAX_STEPS: usize = 1000;
/// The air resistance control reads in tenths of the per-step drag coefficient.
pub const AIR_RESISTANCE_SCALE: f64 = 10.0;
/// Depth speed of the 3D variant, as a fraction of launch speed.
pub const DEPTH_SPEED_RATIO_3D: f64 = 0.1;

/// Launch configuration. Mass is fixed at 1 kg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    /// Elevation above horizontal, degrees.
    pub angle_deg: f64,
    /// Launch speed (m/s).
    pub speed: f64,
    pub gravity: f64,
    /// Air resistance as set on the control panel; divided by
    /// [`AIR_RESISTANCE_SCALE`] to get the drag coefficient.
    pub air_resistance: f64,
    /// Forward depth speed as a fraction of `speed`; zero for the planar demo.
    pub depth_ratio: f64,
}

impl Launch {
    pub fn planar(angle_deg: f64, speed: f64, gravity: f64, air_resistance: f64) -> Self {
        Self {
            angle_deg,
            speed,
            gravity,
            air_resistance,
            depth_ratio: 0.0,
        }
    }

    pub fn initial_velocity(&self) -> Vector3<f64> {
        let (s, c) = self.angle_deg.to_radians().sin_cos();
        Vector3::new(
            self.speed * c,
            self.speed * s,
            self.speed * self.depth_ratio,
        )
    }

    pub fn drag_coefficient(&self) -> f64 {
        self.air_resistance / AIR_RESISTANCE_SCALE
    }
}

/// One sampled state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub t: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl TrajectoryPoint {
    pub fn speed(&self) -> f64 {
        magnitude3(&self.velocity)
    }

    /// Direction of travel in the vertical plane, degrees.
    pub fn heading_deg(&self) -> f64 {
        self.velocity.y.atan2(self.velocity.x).to_degrees()
    }

    /// Ground-plane projection used by the planar demo.
    pub fn planar(&self) -> Vector2<f64> {
        Vector2::new(self.position.x, self.position.y)
    }
}

/// Energy readout at one sample, for unit mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointStats {
    pub speed: f64,
    pub heading_deg: f64,
    pub potential: f64,
    pub kinetic: f64,
    pub energy_lost: f64,
}

/// Immutable sample sequence, monotonically increasing in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    launch: Launch,
    points: Vec<TrajectoryPoint>,
    initial_energy: f64,
}

impl Trajectory {
    /// Integrate the launch until the projectile reaches the ground or the
    /// step cap is hit.
    ///
    /// Per step: drag scales the velocity, the position advances with the
    /// exact constant-gravity displacement, then gravity updates `vy`. The
    /// first stepped state at or below ground is clamped to `y = 0` and ends
    /// the sequence.
    pub fn compute(launch: Launch) -> Self {
        let dt = TRAJECTORY_DT;
        let g = launch.gravity;
        let drag = launch.drag_coefficient();
        let mut pos = Vector3::zeros();
        let mut vel = launch.initial_velocity();
        let mut t = 0.0;

        let mut points = Vec::with_capacity(64);
        points.push(TrajectoryPoint { t, position: pos, velocity: vel });

        for _ in 0..MAX_STEPS {
            apply_linear_drag(&mut vel, drag, dt);
            pos.x += vel.x * dt;
            pos.y += vel.y * dt - 0.5 * g * dt * dt;
            pos.z += vel.z * dt;
            vel.y = apply_gravity(vel.y, g, dt);
            t += dt;

            if pos.y <= 0.0 {
                pos.y = 0.0;
                points.push(TrajectoryPoint { t, position: pos, velocity: vel });
                break;
            }
            points.push(TrajectoryPoint { t, position: pos, velocity: vel });
        }

        let initial_energy = energy::kinetic(1.0, magnitude3(&launch.initial_velocity()));
        Self {
            launch,
            points,
            initial_energy,
        }
    }

    pub fn launch(&self) -> &Launch {
        &self.launch
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrajectoryPoint> {
        self.points.get(index)
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn initial_energy(&self) -> f64 {
        self.initial_energy
    }

    /// Whether the sequence ended on the ground rather than at the step cap.
    pub fn landed(&self) -> bool {
        self.points.len() > 1 && self.last().is_some_and(|p| p.position.y <= 0.0)
    }

    /// Horizontal distance at the final sample.
    pub fn range(&self) -> f64 {
        self.last().map(|p| p.position.x).unwrap_or(0.0)
    }

    /// Highest sample among the first `upto + 1` points.
    pub fn peak_upto(&self, upto: usize) -> Option<&TrajectoryPoint> {
        let end = (upto + 1).min(self.points.len());
        self.points[..end]
            .iter()
            .fold(None, |best: Option<&TrajectoryPoint>, p| match best {
                Some(b) if b.position.y >= p.position.y => Some(b),
                _ => Some(p),
            })
    }

    pub fn stats_at(&self, index: usize) -> Option<PointStats> {
        let p = self.points.get(index)?;
        let speed = p.speed();
        let kinetic = energy::kinetic(1.0, speed);
        let potential = energy::gravitational_potential(1.0, self.launch.gravity, p.position.y);
        Some(PointStats {
            speed,
            heading_deg: p.heading_deg(),
            potential,
            kinetic,
            energy_lost: energy::energy_loss(self.initial_energy, kinetic, potential),
        })
    }
}

/// Fractional cursor over a trajectory, advanced by the speed multiplier
/// once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Playback {
    cursor: f64,
}

impl Playback {
    pub fn index(&self) -> usize {
        self.cursor.max(0.0).floor() as usize
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn rewind(&mut self) {
        self.cursor = 0.0;
    }

    pub fn is_finished(&self, len: usize) -> bool {
        len == 0 || self.cursor >= (len - 1) as f64
    }

    /// Move forward by `speed` samples. Returns false once the cursor has
    /// reached the last sample.
    pub fn advance(&mut self, speed: f64, len: usize) -> bool {
        if self.is_finished(len) {
            return false;
        }
        self.cursor += speed.max(0.0);
        true
    }

    /// Sample index clamped into the trajectory.
    pub fn clamped_index(&self, len: usize) -> usize {
        self.index().min(len.saturating_sub(1))
    }
}
