use super::{FlagSpec, ParamSpec, Scene, TickOutcome, SIM_SPEED, sanitize};
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::pendulum::{
    DEFAULT_LENGTH, DEFAULT_MASS, DEFAULT_START_ANGLE_DEG, MAX_SEGMENTS, PendulumChain,
    PendulumParams,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRAVITY: f64 = 9.8;
pub const DEFAULT_AIR_RESISTANCE: f64 = 0.0;

const MODEL: &str = "pendulum";

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("gravity", "Gravity", "m/s²", 0.1, 30.0, DEFAULT_GRAVITY),
    ParamSpec::new("air-resistance", "Air resistance", "1/s", 0.0, 2.0, DEFAULT_AIR_RESISTANCE),
    SIM_SPEED,
    ParamSpec::new("angle-1", "Angle 1", "deg", 0.0, 90.0, DEFAULT_START_ANGLE_DEG),
    ParamSpec::new("mass-1", "Mass 1", "kg", 1.0, 10.0, DEFAULT_MASS),
    ParamSpec::new("length-1", "Length 1", "m", 1.0, 20.0, DEFAULT_LENGTH),
    ParamSpec::new("angle-2", "Angle 2", "deg", 0.0, 90.0, DEFAULT_START_ANGLE_DEG),
    ParamSpec::new("mass-2", "Mass 2", "kg", 1.0, 10.0, DEFAULT_MASS),
    ParamSpec::new("length-2", "Length 2", "m", 1.0, 20.0, DEFAULT_LENGTH),
    ParamSpec::new("angle-3", "Angle 3", "deg", 0.0, 90.0, DEFAULT_START_ANGLE_DEG),
    ParamSpec::new("mass-3", "Mass 3", "kg", 1.0, 10.0, DEFAULT_MASS),
    ParamSpec::new("length-3", "Length 3", "m", 1.0, 20.0, DEFAULT_LENGTH),
];

pub const FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: "real-physics",
        label: "Real physics",
        default: false,
    },
    FlagSpec {
        name: "segment-2",
        label: "2nd pendulum",
        default: false,
    },
    FlagSpec {
        name: "segment-3",
        label: "3rd pendulum",
        default: false,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumSettings {
    pub gravity: f64,
    pub air_resistance: f64,
    pub real_physics: bool,
    pub sim_speed: f64,
}

impl Default for PendulumSettings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            air_resistance: DEFAULT_AIR_RESISTANCE,
            real_physics: false,
            sim_speed: super::DEFAULT_SIM_SPEED,
        }
    }
}

impl PendulumSettings {
    pub fn sanitized(self) -> Result<Self> {
        Ok(Self {
            gravity: sanitize(PARAMS, "gravity", self.gravity)?,
            air_resistance: sanitize(PARAMS, "air-resistance", self.air_resistance)?,
            real_physics: self.real_physics,
            sim_speed: sanitize(PARAMS, "sim-speed", self.sim_speed)?,
        })
    }

    pub fn physics(&self) -> PendulumParams {
        PendulumParams {
            gravity: self.gravity,
            damping: self.air_resistance,
            real_physics: self.real_physics,
        }
    }
}

/// Pendulum demo: a chain of up to three segments.
#[derive(Debug, Clone)]
pub struct PendulumModel {
    settings: PendulumSettings,
    chain: PendulumChain,
    /// Start angle (rad) each slot returns to on reset.
    start_angles: [f64; MAX_SEGMENTS],
}

impl Default for PendulumModel {
    fn default() -> Self {
        Self::new(PendulumSettings::default())
    }
}

impl PendulumModel {
    pub fn new(settings: PendulumSettings) -> Self {
        let chain = PendulumChain::default();
        let start_angles = std::array::from_fn(|i| chain.segments()[i].theta);
        Self {
            settings,
            chain,
            start_angles,
        }
    }

    pub fn settings(&self) -> &PendulumSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PendulumSettings) -> Result<()> {
        self.settings = settings.sanitized()?;
        Ok(())
    }

    pub fn chain(&self) -> &PendulumChain {
        &self.chain
    }

    pub fn enable_segment(&mut self, index: usize, on: bool) -> Result<()> {
        if on {
            self.chain.enable(index)
        } else {
            self.chain.disable(index)
        }
    }

    pub fn prepare_run(&mut self) -> Result<()> {
        Ok(())
    }

    /// Every enabled segment back to its start angle, at rest.
    pub fn reset(&mut self) {
        self.chain.restart(&self.start_angles);
    }

    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        let physics = self.settings.physics();
        self.chain.step(&physics, dt * self.settings.sim_speed);
        TickOutcome::Continue
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "gravity" => self.settings.gravity = value,
            "air-resistance" => self.settings.air_resistance = value,
            "sim-speed" => self.settings.sim_speed = value,
            _ => {
                let (field, index) = split_indexed(name).ok_or_else(|| unknown_param(name))?;
                match field {
                    "angle" => {
                        let theta = value.to_radians();
                        self.chain.set_start_angle(index, theta)?;
                        self.start_angles[index] = theta;
                    }
                    "mass" => self.chain.set_mass(index, value)?,
                    "length" => self.chain.set_length(index, value)?,
                    _ => return Err(unknown_param(name)),
                }
            }
        }
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<()> {
        match name {
            "real-physics" => {
                self.settings.real_physics = on;
                Ok(())
            }
            "segment-2" => self.enable_segment(1, on),
            "segment-3" => self.enable_segment(2, on),
            _ => Err(EngineError::UnknownFlag {
                model: MODEL,
                name: name.to_string(),
            }),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let g = self.settings.gravity;
        let mut d = Diagnostics::new();
        for (s, stats) in self.chain.enabled().zip(self.chain.segment_stats(g)) {
            let group = format!("Pendulum {}", stats.index + 1);
            d.push(group.clone(), "Mass", s.mass, "kg");
            d.push(group.clone(), "Length", s.length, "m");
            d.push(group.clone(), "Angle", stats.theta_deg, "deg");
            d.push(group.clone(), "ω", stats.omega, "rad/s");
            d.push(group.clone(), "α", stats.alpha, "rad/s²");
            d.push(group.clone(), "Speed", stats.speed, "m/s");
            d.push(group.clone(), "PE", stats.potential, "J");
            d.push(group.clone(), "KE", stats.kinetic, "J");
            d.push(group, "Total Energy", stats.total, "J");
        }
        d.push("Chain", "Segments", self.chain.enabled_count() as f64, "");
        d.push("Chain", "Coupled energy", self.chain.chain_energy(g), "J");
        if self.settings.real_physics && self.chain.enabled_count() == 3 {
            d.note("third segment uses the pairwise double-pendulum approximation");
        }
        d
    }

    pub fn scene(&self) -> Scene {
        Scene::Pendulum {
            bobs: self.chain.bob_positions(),
        }
    }
}

/// `"angle-2"` -> `("angle", 1)`
fn split_indexed(name: &str) -> Option<(&str, usize)> {
    let (field, number) = name.rsplit_once('-')?;
    let number: usize = number.parse().ok()?;
    if number == 0 || number > MAX_SEGMENTS {
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
    use approx::assert_abs_diff_eq;

    #[test]
    fn indexed_names() {
        assert_eq!(split_indexed("angle-2"), Some(("angle", 1)));
        assert_eq!(split_indexed("mass-4"), None);
        assert_eq!(split_indexed("gravity"), None);
    }

    #[test]
    fn angle_edit_puts_segment_at_rest() {
        let mut model = PendulumModel::default();
        for _ in 0..10 {
            model.tick(0.016);
        }
        assert!(model.chain().segments()[0].omega != 0.0);
        model.set_param("angle-1", 30.0).unwrap();
        let s = model.chain().segments()[0];
        assert_abs_diff_eq!(s.theta, 30f64.to_radians(), epsilon = 1e-12);
        assert_eq!(s.omega, 0.0);
        assert_eq!(s.alpha, 0.0);
    }

    #[test]
    fn reset_restores_start_angles() {
        let mut model = PendulumModel::default();
        model.set_flag("segment-2", true).unwrap();
        model.set_param("angle-2", 10.0).unwrap();
        for _ in 0..50 {
            model.tick(0.016);
        }
        model.reset();
        let segs = model.chain().segments();
        assert_abs_diff_eq!(segs[0].theta, 45f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(segs[1].theta, 10f64.to_radians(), epsilon = 1e-12);
        assert_eq!(segs[1].omega, 0.0);
    }

    #[test]
    fn loaded_settings_are_checked() {
        let mut model = PendulumModel::default();
        let bad = PendulumSettings {
            gravity: f64::NAN,
            ..PendulumSettings::default()
        };
        assert!(matches!(
            model.set_settings(bad),
            Err(EngineError::NonFiniteValue { .. })
        ));
        assert_eq!(model.settings().gravity, DEFAULT_GRAVITY);

        model
            .set_settings(PendulumSettings {
                gravity: 100.0,
                sim_speed: 0.0,
                ..PendulumSettings::default()
            })
            .unwrap();
        assert_eq!(model.settings().gravity, 30.0);
        assert_eq!(model.settings().sim_speed, 0.1);
        model.tick(0.016);
        assert!(model.chain().segments()[0].theta.is_finite());
    }

    #[test]
    fn third_flag_requires_second() {
        let mut model = PendulumModel::default();
        assert!(model.set_flag("segment-3", true).is_err());
        model.set_flag("segment-2", true).unwrap();
        model.set_flag("segment-3", true).unwrap();
        model.set_flag("segment-2", false).unwrap();
        assert_eq!(model.chain().enabled_count(), 1);
    }

    #[test]
    fn sim_speed_scales_the_step() {
        let mut slow = PendulumModel::default();
        let mut fast = PendulumModel::default();
        fast.set_param("sim-speed", 2.0).unwrap();
        slow.tick(0.032);
        fast.tick(0.016);
        assert_eq!(slow.chain().segments()[0], fast.chain().segments()[0]);
    }

    #[test]
    fn diagnostics_list_each_enabled_segment() {
        let mut model = PendulumModel::default();
        model.set_flag("segment-2", true).unwrap();
        let d = model.diagnostics();
        assert!(d.get_in("Pendulum 2", "PE").is_some());
        assert!(d.get_in("Pendulum 3", "PE").is_none());
        assert_eq!(d.get("Segments"), Some(2.0));
    }
}
