//! Fixed-step integrators over `nalgebra` state vectors.
//!
//! No error control: every call advances exactly one `dt`.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// Time derivative of an N-dimensional state.
pub trait Derivative<const N: usize> {
    fn derivative(&self, state: &SVector<f64, N>) -> SVector<f64, N>;
}

// Any closure `Fn(&state) -> state` can be used as a derivative.
impl<F, const N: usize> Derivative<N> for F
where
    F: Fn(&SVector<f64, N>) -> SVector<f64, N>,
{
    fn derivative(&self, state: &SVector<f64, N>) -> SVector<f64, N> {
        (self)(state)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegratorKind {
    #[default]
    Euler,
    Rk4,
}

impl IntegratorKind {
    pub fn step<const N: usize, D: Derivative<N>>(
        self,
        state: &SVector<f64, N>,
        f: &D,
        dt: f64,
    ) -> SVector<f64, N> {
        match self {
            IntegratorKind::Euler => step_euler(state, f, dt),
            IntegratorKind::Rk4 => step_rk4(state, f, dt),
        }
    }
}

/// `state + f(state) * dt`
pub fn step_euler<const N: usize, D: Derivative<N>>(
    state: &SVector<f64, N>,
    f: &D,
    dt: f64,
) -> SVector<f64, N> {
    state + f.derivative(state) * dt
}

/// Classical four-stage Runge-Kutta.
pub fn step_rk4<const N: usize, D: Derivative<N>>(
    state: &SVector<f64, N>,
    f: &D,
    dt: f64,
) -> SVector<f64, N> {
    let k1 = f.derivative(state);
    let k2 = f.derivative(&(state + 0.5 * dt * k1));
    let k3 = f.derivative(&(state + 0.5 * dt * k2));
    let k4 = f.derivative(&(state + dt * k3));
    state + (dt / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
}

/// Velocity-first Euler step for a second-order system, as the demos update
/// their bodies: `v += a(x, v) dt`, then `x += v dt` with the new velocity.
///
/// Returns the acceleration that was applied so callers can display it.
pub fn step_velocity_first<const M: usize, A>(
    x: &mut SVector<f64, M>,
    v: &mut SVector<f64, M>,
    accel: A,
    dt: f64,
) -> SVector<f64, M>
where
    A: Fn(&SVector<f64, M>, &SVector<f64, M>) -> SVector<f64, M>,
{
    let a = accel(&*x, &*v);
    *v += a * dt;
    *x += *v * dt;
    a
}
