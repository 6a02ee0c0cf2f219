use super::{FlagSpec, HaltReason, ParamSpec, Scene, TickOutcome, SIM_SPEED, sanitize};
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::rotating_spring::{
    DEFAULT_ANGULAR_SPEED, DEFAULT_MASS, DEFAULT_REST_LENGTH, DEFAULT_STIFFNESS, RotatingSpring,
    RotatingSpringParams, clamp_angular_speed,
};
use serde::{Deserialize, Serialize};

const MODEL: &str = "rotating-spring";

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("angular-speed", "Angular speed", "rad/s", 0.0, 10.0, DEFAULT_ANGULAR_SPEED),
    ParamSpec::new("stiffness", "Spring constant", "N/m", 0.5, 50.0, DEFAULT_STIFFNESS),
    ParamSpec::new("rest-length", "Rest length", "m", 1.0, 15.0, DEFAULT_REST_LENGTH),
    ParamSpec::new("mass", "Mass", "kg", 0.1, 10.0, DEFAULT_MASS),
    SIM_SPEED,
];

pub const FLAGS: &[FlagSpec] = &[FlagSpec {
    name: "terminal-speed",
    label: "Terminal speed analysis",
    default: false,
}];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatingSpringSettings {
    pub spring: RotatingSpringParams,
    pub sim_speed: f64,
}

impl Default for RotatingSpringSettings {
    fn default() -> Self {
        Self {
            spring: RotatingSpringParams::default(),
            sim_speed: super::DEFAULT_SIM_SPEED,
        }
    }
}

impl RotatingSpringSettings {
    /// Copy with every value clamped into its slider range.
    pub fn sanitized(self) -> Result<Self> {
        let p = self.spring;
        Ok(Self {
            spring: RotatingSpringParams {
                angular_speed: sanitize(PARAMS, "angular-speed", p.angular_speed)?,
                stiffness: sanitize(PARAMS, "stiffness", p.stiffness)?,
                rest_length: sanitize(PARAMS, "rest-length", p.rest_length)?,
                mass: sanitize(PARAMS, "mass", p.mass)?,
            },
            sim_speed: sanitize(PARAMS, "sim-speed", self.sim_speed)?,
        })
    }
}

/// Rotating spring demo.
#[derive(Debug, Clone)]
pub struct RotatingSpringModel {
    settings: RotatingSpringSettings,
    spring: RotatingSpring,
    show_terminal_speed: bool,
}

impl Default for RotatingSpringModel {
    fn default() -> Self {
        Self::new(RotatingSpringSettings::default())
    }
}

impl RotatingSpringModel {
    pub fn new(settings: RotatingSpringSettings) -> Self {
        Self {
            spring: RotatingSpring::new(&settings.spring),
            settings,
            show_terminal_speed: false,
        }
    }

    pub fn settings(&self) -> &RotatingSpringSettings {
        &self.settings
    }

    /// Replace every parameter. Values are clamped to their slider ranges,
    /// but the angular speed is not capped below the critical speed, so a
    /// loaded configuration can describe a broken spring.
    pub fn set_settings(&mut self, settings: RotatingSpringSettings) -> Result<()> {
        self.settings = settings.sanitized()?;
        self.spring.update_target(&self.settings.spring);
        Ok(())
    }

    pub fn spring(&self) -> &RotatingSpring {
        &self.spring
    }

    pub fn prepare_run(&mut self) -> Result<()> {
        RotatingSpring::check_can_run(&self.settings.spring)
    }

    pub fn reset(&mut self) {
        self.spring.reset(&self.settings.spring);
    }

    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        if self.spring.is_broken() {
            return TickOutcome::Halt(HaltReason::SpringBroken);
        }
        self.spring.step(&self.settings.spring, dt * self.settings.sim_speed);
        TickOutcome::Continue
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        let p = &mut self.settings.spring;
        match name {
            "angular-speed" => {
                let capped = clamp_angular_speed(value, p.stiffness, p.mass);
                if capped < value {
                    log::debug!(
                        "angular speed capped at {:.2} rad/s (critical {:.2} rad/s)",
                        capped,
                        p.critical_speed()
                    );
                }
                p.angular_speed = capped;
            }
            "stiffness" => p.stiffness = value,
            "rest-length" => p.rest_length = value,
            "mass" => p.mass = value,
            "sim-speed" => {
                self.settings.sim_speed = value;
                return Ok(());
            }
            _ => {
                return Err(EngineError::UnknownParameter {
                    model: MODEL,
                    name: name.to_string(),
                });
            }
        }
        self.spring.update_target(&self.settings.spring);
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<()> {
        match name {
            "terminal-speed" => {
                self.show_terminal_speed = on;
                Ok(())
            }
            _ => Err(EngineError::UnknownFlag {
                model: MODEL,
                name: name.to_string(),
            }),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let p = &self.settings.spring;
        let a = self.spring.analysis(p);
        let mut d = Diagnostics::new();
        d.push("Spring", "Length", a.length, "m");
        d.push("Spring", "Rest Length", p.rest_length, "m");
        d.push("Spring", "Stretch", a.stretch, "m");
        d.push("Forces", "Spring Force", a.spring_force, "N");
        d.push("Forces", "Centrifugal Force", a.centrifugal_force, "N");
        d.push("Motion", "Angular Speed", p.angular_speed, "rad/s");
        d.push("Motion", "Tangential Velocity", a.tangential_velocity, "m/s");
        d.push("Motion", "Angle", a.angle_deg, "deg");
        d.push("Energy", "Kinetic Energy", a.kinetic, "J");
        d.push("Energy", "Spring Potential", a.spring_potential, "J");
        d.push("Energy", "Total Energy", a.total, "J");
        if self.show_terminal_speed {
            d.push("Terminal Speed", "Critical Speed", a.critical_speed, "rad/s");
            d.push("Terminal Speed", "Safety Factor", a.safety_factor, "x");
            d.push("Terminal Speed", "Percent of Critical", a.percent_of_critical, "%");
            d.note(a.safety.label());
        }
        if a.will_break || self.spring.is_broken() {
            d.note(format!(
                "spring will break: reduce angular speed below {:.2} rad/s",
                a.critical_speed
            ));
        }
        d
    }

    pub fn scene(&self) -> Scene {
        Scene::RotatingSpring {
            bob: self.spring.bob_position(),
            length: self.spring.length,
            angle: self.spring.angle,
            broken: self.spring.is_broken(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn requested_speed_above_critical_is_capped() {
        let mut model = RotatingSpringModel::default();
        model.set_param("angular-speed", 10.0).unwrap();
        assert_abs_diff_eq!(
            model.settings().spring.angular_speed,
            0.99 * 5f64.sqrt(),
            epsilon = 1e-12
        );
        assert!(!model.spring().is_broken());
        assert!(model.prepare_run().is_ok());
    }

    #[test]
    fn softening_the_spring_breaks_it_and_halts() {
        let mut model = RotatingSpringModel::default();
        assert_eq!(model.tick(0.016), TickOutcome::Continue);
        model.set_param("stiffness", 2.0).unwrap();
        assert!(model.spring().is_broken());
        assert_eq!(model.tick(0.016), TickOutcome::Halt(HaltReason::SpringBroken));
        assert!(matches!(model.prepare_run(), Err(EngineError::WouldBreak { .. })));
        assert!(!model.diagnostics().notes.is_empty());
    }

    #[test]
    fn loaded_settings_are_clamped_but_not_capped() {
        let mut model = RotatingSpringModel::default();
        let mut settings = RotatingSpringSettings::default();
        settings.spring.mass = f64::NAN;
        assert!(matches!(
            model.set_settings(settings),
            Err(EngineError::NonFiniteValue { .. })
        ));
        assert_eq!(model.settings(), &RotatingSpringSettings::default());

        settings.spring.mass = 1.0;
        settings.spring.angular_speed = 25.0;
        model.set_settings(settings).unwrap();
        assert_eq!(model.settings().spring.angular_speed, 10.0);
        assert!(model.spring().is_broken());
        assert!(model.spring().target().is_finite());
    }

    #[test]
    fn reset_returns_to_rest_length() {
        let mut model = RotatingSpringModel::default();
        for _ in 0..100 {
            model.tick(0.016);
        }
        assert!(model.spring().length > DEFAULT_REST_LENGTH);
        model.reset();
        assert_eq!(model.spring().length, DEFAULT_REST_LENGTH);
        assert_eq!(model.spring().angle, 0.0);
    }

    #[test]
    fn terminal_speed_section_is_optional() {
        let mut model = RotatingSpringModel::default();
        assert!(model.diagnostics().get("Critical Speed").is_none());
        model.set_flag("terminal-speed", true).unwrap();
        let d = model.diagnostics();
        assert_abs_diff_eq!(d.get("Critical Speed").unwrap(), 5f64.sqrt(), epsilon = 1e-12);
        assert!(d.notes.iter().any(|n| n == "APPROACHING LIMIT"));
    }
}
