//! Per-demo compositions of the physics components.
//!
//! Each model owns its bodies and parameters, exposes the same small surface
//! (`reset`, `prepare_run`, `tick`, `set_param`, `set_flag`, `diagnostics`,
//! `scene`) and keeps its own update rules. The engine dispatches over them.

pub mod collision;
pub mod pendulum;
pub mod projectile;
pub mod rotating_spring;
pub mod springs;

use crate::collision::{Block, Bounds};
use crate::error::{EngineError, Result};
use nalgebra::Vector2;
use serde::Serialize;

/// Frame step of the animated demos before the speed multiplier (s).
pub const FRAME_DT: f64 = 0.016;

pub const DEFAULT_SIM_SPEED: f64 = 1.0;

/// A named numeric control with its accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParamSpec {
    pub const fn new(
        name: &'static str,
        label: &'static str,
        unit: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            label,
            unit,
            min,
            max,
            default,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlagSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub default: bool,
}

pub const SIM_SPEED: ParamSpec =
    ParamSpec::new("sim-speed", "Simulation speed", "x", 0.1, 5.0, DEFAULT_SIM_SPEED);

pub fn find_param<'a>(specs: &'a [ParamSpec], name: &str) -> Option<&'a ParamSpec> {
    specs.iter().find(|p| p.name == name)
}

/// Check a value headed for a model: non-finite input is rejected, and names
/// present in `specs` are clamped into their range.
pub fn sanitize(specs: &[ParamSpec], name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(EngineError::NonFiniteValue {
            name: name.to_string(),
            value,
        });
    }
    Ok(find_param(specs, name).map_or(value, |spec| spec.clamp(value)))
}

pub fn find_flag<'a>(specs: &'a [FlagSpec], name: &str) -> Option<&'a FlagSpec> {
    specs.iter().find(|f| f.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HaltReason {
    PlaybackFinished,
    SpringBroken,
}

/// What the engine should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickOutcome {
    Continue,
    /// Stop running and keep the state for redraw.
    Halt(HaltReason),
    /// Stop running and reinitialize from the current parameters.
    Reset,
}

/// Read-only scene state handed to the renderer once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Scene {
    /// Planar (or already projected) flight path and the playback marker.
    Trajectory {
        path: Vec<Vector2<f64>>,
        current: usize,
        peak: Option<Vector2<f64>>,
    },
    Pendulum {
        bobs: Vec<Vector2<f64>>,
    },
    Blocks {
        bounds: Bounds,
        moving: Block,
        stationary: Block,
        moving_size: f64,
        stationary_size: f64,
    },
    Springs {
        mass: Vector2<f64>,
        anchors: Vec<Vector2<f64>>,
    },
    RotatingSpring {
        bob: Vector2<f64>,
        length: f64,
        angle: f64,
        broken: bool,
    },
}
