use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::models::collision::{self, CollisionModel, CollisionParams};
use crate::models::pendulum::{self, PendulumModel, PendulumSettings};
use crate::models::projectile::{self, ProjectileModel, ProjectileParams};
use crate::models::rotating_spring::{self, RotatingSpringModel, RotatingSpringSettings};
use crate::models::springs::{self, SpringsConfig, SpringsModel};
use crate::models::{FRAME_DT, FlagSpec, ParamSpec, Scene, TickOutcome, find_flag, find_param};
use serde::{Deserialize, Serialize};

pub const MODEL_PROJECTILE: &str = "projectile";
pub const MODEL_PROJECTILE_3D: &str = "projectile-3d";
pub const MODEL_PENDULUM: &str = "pendulum";
pub const MODEL_COLLISION: &str = "collision";
pub const MODEL_SPRINGS: &str = "springs";
pub const MODEL_ROTATING_SPRING: &str = "rotating-spring";

/// Largest step an elapsed-time clock will hand to a model (s).
pub const MAX_ELAPSED_DT: f64 = 0.05;

/// How a frame timestamp turns into a simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TickPolicy {
    /// Same step every frame, whatever the wall clock says.
    Fixed { dt: f64 },
    /// Wall time since the previous frame, clamped to `max_dt`. The first
    /// frame after a (re)start steps by zero.
    Elapsed { max_dt: f64 },
}

impl Default for TickPolicy {
    fn default() -> Self {
        TickPolicy::Fixed { dt: FRAME_DT }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    policy: TickPolicy,
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(policy: TickPolicy) -> Self {
        Self {
            policy,
            last_ms: None,
        }
    }

    pub fn policy(&self) -> TickPolicy {
        self.policy
    }

    /// Forget the previous timestamp.
    pub fn restart(&mut self) {
        self.last_ms = None;
    }

    /// Step for a frame at `timestamp_ms` (animation-frame milliseconds).
    pub fn next_dt(&mut self, timestamp_ms: f64) -> f64 {
        match self.policy {
            TickPolicy::Fixed { dt } => dt,
            TickPolicy::Elapsed { max_dt } => {
                let dt = match self.last_ms {
                    Some(last) => ((timestamp_ms - last) / 1000.0).clamp(0.0, max_dt),
                    None => 0.0,
                };
                self.last_ms = Some(timestamp_ms);
                dt
            }
        }
    }
}

pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tick_policy: TickPolicy,
}

pub fn model_catalog() -> &'static [ModelInfo] {
    &[
        ModelInfo {
            id: MODEL_PROJECTILE,
            name: "Projectile",
            description: "Precomputed 2D flight with optional linear drag, played back frame by frame.",
            tick_policy: TickPolicy::Fixed { dt: FRAME_DT },
        },
        ModelInfo {
            id: MODEL_PROJECTILE_3D,
            name: "3D projectile",
            description: "Projectile with forward depth motion and a tiltable perspective view.",
            tick_policy: TickPolicy::Fixed { dt: FRAME_DT },
        },
        ModelInfo {
            id: MODEL_PENDULUM,
            name: "Pendulum",
            description: "Single, double or triple pendulum; simple or coupled equations.",
            tick_policy: TickPolicy::Fixed { dt: FRAME_DT },
        },
        ModelInfo {
            id: MODEL_COLLISION,
            name: "Block collisions",
            description: "Two blocks and a wall with elastic 1D collisions and an optional driving force.",
            tick_policy: TickPolicy::Fixed { dt: FRAME_DT },
        },
        ModelInfo {
            id: MODEL_SPRINGS,
            name: "Spring system",
            description: "A mass held by up to three anchored springs.",
            tick_policy: TickPolicy::Fixed { dt: FRAME_DT },
        },
        ModelInfo {
            id: MODEL_ROTATING_SPRING,
            name: "Rotating spring",
            description: "Spring swung about its anchor, stretching toward the centrifugal balance.",
            tick_policy: TickPolicy::Fixed { dt: FRAME_DT },
        },
    ]
}

pub fn model_info(id: &str) -> Option<&'static ModelInfo> {
    model_catalog().iter().find(|m| m.id == id)
}

pub fn param_catalog(model_id: &str) -> Result<&'static [ParamSpec]> {
    match normalize_model_id(model_id) {
        Some(MODEL_PROJECTILE) => Ok(projectile::PARAMS),
        Some(MODEL_PROJECTILE_3D) => Ok(projectile::PARAMS_3D),
        Some(MODEL_PENDULUM) => Ok(pendulum::PARAMS),
        Some(MODEL_COLLISION) => Ok(collision::PARAMS),
        Some(MODEL_SPRINGS) => Ok(springs::PARAMS),
        Some(MODEL_ROTATING_SPRING) => Ok(rotating_spring::PARAMS),
        _ => Err(EngineError::UnknownModel(model_id.to_string())),
    }
}

pub fn flag_catalog(model_id: &str) -> Result<&'static [FlagSpec]> {
    match normalize_model_id(model_id) {
        Some(MODEL_PROJECTILE) | Some(MODEL_PROJECTILE_3D) => Ok(projectile::FLAGS),
        Some(MODEL_PENDULUM) => Ok(pendulum::FLAGS),
        Some(MODEL_COLLISION) => Ok(collision::FLAGS),
        Some(MODEL_SPRINGS) => Ok(springs::FLAGS),
        Some(MODEL_ROTATING_SPRING) => Ok(rotating_spring::FLAGS),
        _ => Err(EngineError::UnknownModel(model_id.to_string())),
    }
}

/// Receives the scene once per frame. Cannot affect the physics.
pub trait Renderer {
    fn render(&mut self, scene: &Scene);
}

impl<F> Renderer for F
where
    F: FnMut(&Scene),
{
    fn render(&mut self, scene: &Scene) {
        (self)(scene)
    }
}

/// Receives derived readouts once per frame.
pub trait ControlPanel {
    fn show(&mut self, diagnostics: &Diagnostics);
}

impl<F> ControlPanel for F
where
    F: FnMut(&Diagnostics),
{
    fn show(&mut self, diagnostics: &Diagnostics) {
        (self)(diagnostics)
    }
}

/// A whole parameter set for one model, as loaded in one go.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelConfig {
    Projectile(ProjectileParams),
    Pendulum(PendulumSettings),
    Collision(CollisionParams),
    Springs(SpringsConfig),
    RotatingSpring(RotatingSpringSettings),
}

enum ModelKind {
    Projectile(ProjectileModel),
    Pendulum(PendulumModel),
    Collision(CollisionModel),
    Springs(SpringsModel),
    RotatingSpring(RotatingSpringModel),
}

pub struct Engine {
    model_id: &'static str,
    model: ModelKind,
    clock: FrameClock,
    running: bool,
}

impl Engine {
    pub fn new(model_id: &str) -> Result<Self> {
        let model_id = normalize_model_id(model_id)
            .ok_or_else(|| EngineError::UnknownModel(model_id.to_string()))?;
        let model = build_model(model_id)?;
        let policy = model_info(model_id)
            .map(|m| m.tick_policy)
            .unwrap_or_default();
        log::info!("engine created for model '{}'", model_id);
        Ok(Self {
            model_id,
            model,
            clock: FrameClock::new(policy),
            running: false,
        })
    }

    pub fn model_id(&self) -> &'static str {
        self.model_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_policy(&self) -> TickPolicy {
        self.clock.policy()
    }

    pub fn set_tick_policy(&mut self, policy: TickPolicy) {
        self.clock = FrameClock::new(policy);
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        match &self.model {
            ModelKind::Projectile(model) => model.param_specs(),
            ModelKind::Pendulum(_) => pendulum::PARAMS,
            ModelKind::Collision(_) => collision::PARAMS,
            ModelKind::Springs(_) => springs::PARAMS,
            ModelKind::RotatingSpring(_) => rotating_spring::PARAMS,
        }
    }

    pub fn flags(&self) -> &'static [FlagSpec] {
        match &self.model {
            ModelKind::Projectile(_) => projectile::FLAGS,
            ModelKind::Pendulum(_) => pendulum::FLAGS,
            ModelKind::Collision(_) => collision::FLAGS,
            ModelKind::Springs(_) => springs::FLAGS,
            ModelKind::RotatingSpring(_) => rotating_spring::FLAGS,
        }
    }

    /// Start (or resume) ticking. The model may refuse, e.g. a spring that
    /// would break.
    pub fn run(&mut self) -> Result<()> {
        let prepared = match &mut self.model {
            ModelKind::Projectile(model) => model.prepare_run(),
            ModelKind::Pendulum(model) => model.prepare_run(),
            ModelKind::Collision(model) => model.prepare_run(),
            ModelKind::Springs(model) => model.prepare_run(),
            ModelKind::RotatingSpring(model) => model.prepare_run(),
        };
        if let Err(e) = prepared {
            log::warn!("{}: run refused: {}", self.model_id, e);
            return Err(e);
        }
        self.running = true;
        self.clock.restart();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Run when paused, pause when running. Returns the new running state.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.running {
            self.pause();
        } else {
            self.run()?;
        }
        Ok(self.running)
    }

    /// Stop and reinitialize from the current parameters.
    pub fn reset(&mut self) {
        self.running = false;
        self.clock.restart();
        match &mut self.model {
            ModelKind::Projectile(model) => model.reset(),
            ModelKind::Pendulum(model) => model.reset(),
            ModelKind::Collision(model) => model.reset(),
            ModelKind::Springs(model) => model.reset(),
            ModelKind::RotatingSpring(model) => model.reset(),
        }
        log::info!("{}: reset", self.model_id);
    }

    /// Advance the model by exactly `dt` before its speed multiplier,
    /// whether or not the engine is running, and apply the outcome.
    pub fn step(&mut self, dt: f64) -> TickOutcome {
        let outcome = match &mut self.model {
            ModelKind::Projectile(model) => model.tick(dt),
            ModelKind::Pendulum(model) => model.tick(dt),
            ModelKind::Collision(model) => model.tick(dt),
            ModelKind::Springs(model) => model.tick(dt),
            ModelKind::RotatingSpring(model) => model.tick(dt),
        };
        match outcome {
            TickOutcome::Continue => {}
            TickOutcome::Halt(reason) => {
                if self.running {
                    log::info!("{}: halted ({:?})", self.model_id, reason);
                }
                self.running = false;
            }
            TickOutcome::Reset => self.reset(),
        }
        outcome
    }

    /// One animation frame without collaborators. Returns `None` while paused.
    pub fn advance(&mut self, timestamp_ms: f64) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }
        let dt = self.clock.next_dt(timestamp_ms);
        Some(self.step(dt))
    }

    /// One animation frame: physics, then the renderer, then the panel.
    pub fn frame<R, P>(&mut self, timestamp_ms: f64, renderer: &mut R, panel: &mut P) -> Option<TickOutcome>
    where
        R: Renderer + ?Sized,
        P: ControlPanel + ?Sized,
    {
        let outcome = self.advance(timestamp_ms);
        renderer.render(&self.scene());
        panel.show(&self.diagnostics());
        outcome
    }

    /// Set a named parameter, clamped into its catalog range. Returns the
    /// value actually applied.
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(EngineError::NonFiniteValue {
                name: name.to_string(),
                value,
            });
        }
        let spec = find_param(self.params(), name).ok_or_else(|| EngineError::UnknownParameter {
            model: self.model_id,
            name: name.to_string(),
        })?;
        let clamped = spec.clamp(value);
        if clamped != value {
            log::debug!(
                "{}: '{}' clamped from {} to {}",
                self.model_id,
                name,
                value,
                clamped
            );
        }
        match &mut self.model {
            ModelKind::Projectile(model) => model.set_param(name, clamped)?,
            ModelKind::Pendulum(model) => model.set_param(name, clamped)?,
            ModelKind::Collision(model) => model.set_param(name, clamped)?,
            ModelKind::Springs(model) => model.set_param(name, clamped)?,
            ModelKind::RotatingSpring(model) => model.set_param(name, clamped)?,
        }
        Ok(clamped)
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<()> {
        if find_flag(self.flags(), name).is_none() {
            return Err(EngineError::UnknownFlag {
                model: self.model_id,
                name: name.to_string(),
            });
        }
        match &mut self.model {
            ModelKind::Projectile(model) => model.set_flag(name, on),
            ModelKind::Pendulum(model) => model.set_flag(name, on),
            ModelKind::Collision(model) => model.set_flag(name, on),
            ModelKind::Springs(model) => model.set_flag(name, on),
            ModelKind::RotatingSpring(model) => model.set_flag(name, on),
        }
    }

    /// Enable or disable pendulum segment `number` (1-based).
    pub fn set_segment(&mut self, number: usize, on: bool) -> Result<()> {
        match &mut self.model {
            ModelKind::Pendulum(model) => {
                let index = number
                    .checked_sub(1)
                    .ok_or(EngineError::NoSuchSegment(number))?;
                model.enable_segment(index, on)
            }
            _ => Err(EngineError::Unsupported(self.model_id)),
        }
    }

    /// Load a whole parameter set. The model must match the config kind.
    /// Values are clamped into their catalog ranges; a non-finite value
    /// rejects the whole set and leaves the model untouched.
    pub fn apply_config(&mut self, config: ModelConfig) -> Result<()> {
        let loaded = match (&mut self.model, config) {
            (ModelKind::Projectile(model), ModelConfig::Projectile(params)) => {
                model.set_params(params)
            }
            (ModelKind::Pendulum(model), ModelConfig::Pendulum(settings)) => {
                model.set_settings(settings)
            }
            (ModelKind::Collision(model), ModelConfig::Collision(params)) => {
                model.set_params(params)
            }
            (ModelKind::Springs(model), ModelConfig::Springs(config)) => model.configure(config),
            (ModelKind::RotatingSpring(model), ModelConfig::RotatingSpring(settings)) => {
                model.set_settings(settings)
            }
            _ => Err(EngineError::Unsupported(self.model_id)),
        };
        if let Err(e) = loaded {
            log::warn!("{}: configuration rejected: {}", self.model_id, e);
            return Err(e);
        }
        log::info!("{}: configuration loaded", self.model_id);
        Ok(())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        match &self.model {
            ModelKind::Projectile(model) => model.diagnostics(),
            ModelKind::Pendulum(model) => model.diagnostics(),
            ModelKind::Collision(model) => model.diagnostics(),
            ModelKind::Springs(model) => model.diagnostics(),
            ModelKind::RotatingSpring(model) => model.diagnostics(),
        }
    }

    pub fn scene(&self) -> Scene {
        match &self.model {
            ModelKind::Projectile(model) => model.scene(),
            ModelKind::Pendulum(model) => model.scene(),
            ModelKind::Collision(model) => model.scene(),
            ModelKind::Springs(model) => model.scene(),
            ModelKind::RotatingSpring(model) => model.scene(),
        }
    }
}

fn normalize_model_id(id: &str) -> Option<&'static str> {
    match id {
        MODEL_PROJECTILE => Some(MODEL_PROJECTILE),
        MODEL_PROJECTILE_3D | "3d-projectile" => Some(MODEL_PROJECTILE_3D),
        MODEL_PENDULUM => Some(MODEL_PENDULUM),
        MODEL_COLLISION => Some(MODEL_COLLISION),
        MODEL_SPRINGS => Some(MODEL_SPRINGS),
        MODEL_ROTATING_SPRING => Some(MODEL_ROTATING_SPRING),
        _ => None,
    }
}

fn build_model(model_id: &'static str) -> Result<ModelKind> {
    match model_id {
        MODEL_PROJECTILE => Ok(ModelKind::Projectile(ProjectileModel::planar())),
        MODEL_PROJECTILE_3D => Ok(ModelKind::Projectile(ProjectileModel::depth())),
        MODEL_PENDULUM => Ok(ModelKind::Pendulum(PendulumModel::default())),
        MODEL_COLLISION => Ok(ModelKind::Collision(CollisionModel::default())),
        MODEL_SPRINGS => Ok(ModelKind::Springs(SpringsModel::default())),
        MODEL_ROTATING_SPRING => Ok(ModelKind::RotatingSpring(RotatingSpringModel::default())),
        _ => Err(EngineError::UnknownModel(model_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HaltReason;

    #[test]
    fn every_catalog_entry_builds() {
        for info in model_catalog() {
            let engine = Engine::new(info.id).unwrap();
            assert_eq!(engine.model_id(), info.id);
            assert!(!engine.params().is_empty());
            assert!(param_catalog(info.id).is_ok());
            assert!(flag_catalog(info.id).is_ok());
        }
    }

    #[test]
    fn unknown_model_is_an_error() {
        assert_eq!(
            Engine::new("orrery").err(),
            Some(EngineError::UnknownModel("orrery".to_string()))
        );
    }

    #[test]
    fn paused_engine_does_not_tick() {
        let mut engine = Engine::new(MODEL_PENDULUM).unwrap();
        let before = engine.scene();
        assert_eq!(engine.advance(16.0), None);
        assert_eq!(engine.scene(), before);
        engine.run().unwrap();
        assert_eq!(engine.advance(32.0), Some(TickOutcome::Continue));
        assert_ne!(engine.scene(), before);
    }

    #[test]
    fn params_are_clamped() {
        let mut engine = Engine::new(MODEL_PENDULUM).unwrap();
        assert_eq!(engine.set_param("angle-1", 120.0).unwrap(), 90.0);
        assert!(matches!(
            engine.set_param("angle-1", f64::NAN),
            Err(EngineError::NonFiniteValue { .. })
        ));
        assert!(matches!(
            engine.set_param("spin", 1.0),
            Err(EngineError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn elapsed_clock_clamps_and_starts_at_zero() {
        let mut clock = FrameClock::new(TickPolicy::Elapsed { max_dt: MAX_ELAPSED_DT });
        assert_eq!(clock.next_dt(1000.0), 0.0);
        assert!((clock.next_dt(1016.0) - 0.016).abs() < 1e-12);
        assert_eq!(clock.next_dt(3000.0), MAX_ELAPSED_DT);
        assert_eq!(clock.next_dt(2000.0), 0.0);
        clock.restart();
        assert_eq!(clock.next_dt(5000.0), 0.0);
    }

    #[test]
    fn fixed_clock_ignores_timestamps() {
        let mut clock = FrameClock::new(TickPolicy::default());
        assert_eq!(clock.next_dt(0.0), FRAME_DT);
        assert_eq!(clock.next_dt(1e6), FRAME_DT);
    }

    #[test]
    fn projectile_halts_when_playback_ends() {
        let mut engine = Engine::new(MODEL_PROJECTILE).unwrap();
        engine.run().unwrap();
        let mut t = 0.0;
        let mut last = None;
        while engine.is_running() {
            t += 16.0;
            last = engine.advance(t);
        }
        assert_eq!(last, Some(TickOutcome::Halt(HaltReason::PlaybackFinished)));
    }

    #[test]
    fn frame_feeds_both_collaborators() {
        let mut engine = Engine::new(MODEL_SPRINGS).unwrap();
        let mut scenes = 0;
        let mut panels = 0;
        engine.frame(0.0, &mut |_: &Scene| scenes += 1, &mut |_: &Diagnostics| panels += 1);
        assert_eq!((scenes, panels), (1, 1));
    }

    #[test]
    fn segments_only_on_pendulum() {
        let mut engine = Engine::new(MODEL_COLLISION).unwrap();
        assert!(matches!(engine.set_segment(2, true), Err(EngineError::Unsupported(_))));
        let mut engine = Engine::new(MODEL_PENDULUM).unwrap();
        assert!(engine.set_segment(3, true).is_err());
        engine.set_segment(2, true).unwrap();
        engine.set_segment(3, true).unwrap();
    }

    #[test]
    fn non_finite_config_never_reaches_the_state() {
        let mut engine = Engine::new(MODEL_PENDULUM).unwrap();
        let loaded = engine.apply_config(ModelConfig::Pendulum(PendulumSettings {
            gravity: f64::NAN,
            ..PendulumSettings::default()
        }));
        assert!(matches!(loaded, Err(EngineError::NonFiniteValue { .. })));
        engine.run().unwrap();
        engine.advance(0.0);
        let Scene::Pendulum { bobs } = engine.scene() else {
            panic!("wrong scene");
        };
        assert!(bobs.iter().all(|b| b.x.is_finite() && b.y.is_finite()));
    }

    #[test]
    fn out_of_range_config_is_clamped() {
        let mut engine = Engine::new(MODEL_ROTATING_SPRING).unwrap();
        engine
            .apply_config(ModelConfig::RotatingSpring(RotatingSpringSettings {
                sim_speed: 50.0,
                ..RotatingSpringSettings::default()
            }))
            .unwrap();
        let mut settings = RotatingSpringSettings::default();
        settings.sim_speed = 5.0;
        let mut reference = Engine::new(MODEL_ROTATING_SPRING).unwrap();
        reference
            .apply_config(ModelConfig::RotatingSpring(settings))
            .unwrap();
        engine.step(FRAME_DT);
        reference.step(FRAME_DT);
        assert_eq!(engine.scene(), reference.scene());
    }

    #[test]
    fn mismatched_config_is_rejected() {
        let mut engine = Engine::new(MODEL_COLLISION).unwrap();
        assert!(engine
            .apply_config(ModelConfig::Pendulum(PendulumSettings::default()))
            .is_err());
        engine
            .apply_config(ModelConfig::Collision(CollisionParams {
                moving_mass: 10.0,
                ..CollisionParams::default()
            }))
            .unwrap();
        assert!(engine.diagnostics().get_in("Moving Block", "Mass") == Some(10.0));
    }
}
