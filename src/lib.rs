//! Interactive mechanics demos: projectile flight, pendulum chains, block
//! collisions, spring systems and a rotating spring. Each demo is a model
//! driven by [`Engine`], which hands a [`Scene`] to a renderer and
//! [`Diagnostics`] to a control panel every frame.

pub mod collision;
pub mod diagnostics;
pub mod energy;
pub mod engine;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod models;
pub mod pendulum;
pub mod rotating_spring;
pub mod springs;
pub mod trajectory;
pub mod vector;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use diagnostics::{DiagnosticEntry, Diagnostics};
pub use engine::{
    ControlPanel, Engine, FrameClock, ModelConfig, ModelInfo, Renderer, TickPolicy, model_catalog,
};
pub use error::{EngineError, Result};
pub use integrator::IntegratorKind;
pub use models::{HaltReason, Scene, TickOutcome};
