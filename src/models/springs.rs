use super::{FlagSpec, ParamSpec, Scene, TickOutcome, SIM_SPEED, sanitize};
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::springs::{
    DEFAULT_MASS, DEFAULT_REST_LENGTH, DEFAULT_STIFFNESS, MAX_SPRINGS, Spring, SpringSet,
    default_springs,
};
use serde::{Deserialize, Serialize};

const MODEL: &str = "springs";

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("mass", "Mass", "kg", 0.1, 10.0, DEFAULT_MASS),
    ParamSpec::new("air-resistance", "Air resistance", "N·s/m", 0.0, 5.0, 0.0),
    SIM_SPEED,
    ParamSpec::new("k-1", "Spring 1 constant", "N/m", 0.1, 20.0, DEFAULT_STIFFNESS),
    ParamSpec::new("rest-1", "Spring 1 rest length", "m", 0.5, 15.0, DEFAULT_REST_LENGTH),
    ParamSpec::new("k-2", "Spring 2 constant", "N/m", 0.1, 20.0, DEFAULT_STIFFNESS),
    ParamSpec::new("rest-2", "Spring 2 rest length", "m", 0.5, 15.0, DEFAULT_REST_LENGTH),
    ParamSpec::new("k-3", "Spring 3 constant", "N/m", 0.1, 20.0, DEFAULT_STIFFNESS),
    ParamSpec::new("rest-3", "Spring 3 rest length", "m", 0.5, 15.0, DEFAULT_REST_LENGTH),
];

pub const FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: "spring-1",
        label: "Spring 1",
        default: true,
    },
    FlagSpec {
        name: "spring-2",
        label: "Spring 2",
        default: false,
    },
    FlagSpec {
        name: "spring-3",
        label: "Spring 3",
        default: false,
    },
];

/// Everything needed to rebuild the demo from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringsConfig {
    pub mass: f64,
    pub air_resistance: f64,
    pub sim_speed: f64,
    pub springs: [Spring; MAX_SPRINGS],
}

impl Default for SpringsConfig {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            air_resistance: 0.0,
            sim_speed: super::DEFAULT_SIM_SPEED,
            springs: default_springs(),
        }
    }
}

impl SpringsConfig {
    /// Copy with every slider value clamped; anchors only have to be finite.
    pub fn sanitized(self) -> Result<Self> {
        let mut springs = self.springs;
        for (i, spring) in springs.iter_mut().enumerate() {
            let n = i + 1;
            spring.stiffness = sanitize(PARAMS, &format!("k-{}", n), spring.stiffness)?;
            spring.rest_length = sanitize(PARAMS, &format!("rest-{}", n), spring.rest_length)?;
            spring.anchor.x = sanitize(PARAMS, &format!("anchor-{}-x", n), spring.anchor.x)?;
            spring.anchor.y = sanitize(PARAMS, &format!("anchor-{}-y", n), spring.anchor.y)?;
        }
        Ok(Self {
            mass: sanitize(PARAMS, "mass", self.mass)?,
            air_resistance: sanitize(PARAMS, "air-resistance", self.air_resistance)?,
            sim_speed: sanitize(PARAMS, "sim-speed", self.sim_speed)?,
            springs,
        })
    }
}

/// Mass-on-springs demo.
#[derive(Debug, Clone)]
pub struct SpringsModel {
    sim_speed: f64,
    set: SpringSet,
}

impl Default for SpringsModel {
    fn default() -> Self {
        Self {
            sim_speed: super::DEFAULT_SIM_SPEED,
            set: SpringSet::default(),
        }
    }
}

impl SpringsModel {
    /// Replace every setting; the mass returns to the origin.
    pub fn configure(&mut self, config: SpringsConfig) -> Result<()> {
        let config = config.sanitized()?;
        let mut set = SpringSet::new(config.springs, config.mass);
        set.air_resistance = config.air_resistance;
        self.set = set;
        self.sim_speed = config.sim_speed;
        Ok(())
    }

    pub fn config(&self) -> SpringsConfig {
        SpringsConfig {
            mass: self.set.mass,
            air_resistance: self.set.air_resistance,
            sim_speed: self.sim_speed,
            springs: *self.set.springs(),
        }
    }

    pub fn set(&self) -> &SpringSet {
        &self.set
    }

    pub fn set_mut(&mut self) -> &mut SpringSet {
        &mut self.set
    }

    pub fn prepare_run(&mut self) -> Result<()> {
        Ok(())
    }

    pub fn reset(&mut self) {
        self.set.reset();
    }

    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        self.set.step(dt * self.sim_speed);
        TickOutcome::Continue
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "mass" => self.set.mass = value,
            "air-resistance" => self.set.air_resistance = value,
            "sim-speed" => self.sim_speed = value,
            _ => {
                let (field, index) = spring_index(name).ok_or_else(|| unknown_param(name))?;
                let spring = self.set.spring_mut(index)?;
                match field {
                    "k" => spring.stiffness = value,
                    "rest" => spring.rest_length = value,
                    _ => return Err(unknown_param(name)),
                }
            }
        }
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<()> {
        match spring_index(name) {
            Some(("spring", index)) => {
                self.set.spring_mut(index)?.enabled = on;
                log::debug!("spring {} {}", index + 1, if on { "attached" } else { "detached" });
                Ok(())
            }
            _ => Err(EngineError::UnknownFlag {
                model: MODEL,
                name: name.to_string(),
            }),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let s = &self.set;
        let mut d = Diagnostics::new();
        d.push("Mass", "x", s.position.x, "m");
        d.push("Mass", "y", s.position.y, "m");
        d.push("Mass", "vx", s.velocity.x, "m/s");
        d.push("Mass", "vy", s.velocity.y, "m/s");
        d.push("Mass", "KE", s.kinetic(), "J");
        d.push("Mass", "PE", s.potential(), "J");
        d.push("Mass", "Total Energy", s.total_energy(), "J");
        for (i, spring) in s.springs().iter().enumerate().filter(|(_, sp)| sp.enabled) {
            let group = format!("Spring {}", i + 1);
            d.push(group.clone(), "Length", spring.length_to(&s.position), "m");
            d.push(group, "PE", spring.potential_at(&s.position), "J");
        }
        d
    }

    pub fn scene(&self) -> Scene {
        Scene::Springs {
            mass: self.set.position,
            anchors: self.set.active().map(|s| s.anchor).collect(),
        }
    }
}

/// `"k-2"` -> `("k", 1)`
fn spring_index(name: &str) -> Option<(&str, usize)> {
    let (field, number) = name.rsplit_once('-')?;
    let number: usize = number.parse().ok()?;
    if number == 0 || number > MAX_SPRINGS {
        return None;
    }
    Some((field, number - 1))
}

fn unknown_param(name: &str) -> EngineError {
    EngineError::UnknownParameter {
        model: MODEL,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn flags_attach_springs() {
        let mut model = SpringsModel::default();
        model.set_flag("spring-3", true).unwrap();
        assert_eq!(model.set().active().count(), 2);
        assert!(model.set_flag("spring-4", true).is_err());
        let Scene::Springs { anchors, .. } = model.scene() else {
            panic!("wrong scene");
        };
        assert_eq!(anchors, vec![Vector2::new(5.0, 0.0), Vector2::new(0.0, 5.0)]);
    }

    #[test]
    fn top_spring_pulls_mass_up() {
        let mut model = SpringsModel::default();
        model.set_flag("spring-3", true).unwrap();
        model.set_param("rest-3", 1.0).unwrap();
        model.tick(0.016);
        assert!(model.set().velocity.y > 0.0);
    }

    #[test]
    fn reset_keeps_spring_settings() {
        let mut model = SpringsModel::default();
        model.set_param("k-1", 4.0).unwrap();
        model.set_mut().position = Vector2::new(1.0, 1.0);
        model.reset();
        assert_eq!(model.set().position, Vector2::zeros());
        assert_eq!(model.set().springs()[0].stiffness, 4.0);
    }

    #[test]
    fn configure_rebuilds_from_scratch() {
        let mut model = SpringsModel::default();
        model.set_mut().position = Vector2::new(2.0, 0.0);
        let mut config = model.config();
        config.mass = 3.0;
        config.springs[1].enabled = true;
        model.configure(config).unwrap();
        assert_eq!(model.set().position, Vector2::zeros());
        assert_eq!(model.set().mass, 3.0);
        assert_eq!(model.set().active().count(), 2);
        assert_eq!(model.config(), config);
    }

    #[test]
    fn configure_checks_every_field() {
        let mut model = SpringsModel::default();
        let mut config = model.config();
        config.springs[2].anchor.y = f64::NAN;
        assert!(matches!(
            model.configure(config),
            Err(EngineError::NonFiniteValue { .. })
        ));
        assert_eq!(model.config(), SpringsConfig::default());

        let mut config = SpringsConfig::default();
        config.mass = 50.0;
        config.springs[0].stiffness = -3.0;
        config.springs[1].rest_length = 100.0;
        model.configure(config).unwrap();
        assert_eq!(model.set().mass, 10.0);
        assert_eq!(model.set().springs()[0].stiffness, 0.1);
        assert_eq!(model.set().springs()[1].rest_length, 15.0);
    }
}
