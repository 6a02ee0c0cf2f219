use super::{FlagSpec, HaltReason, ParamSpec, Scene, TickOutcome, SIM_SPEED, find_flag, sanitize};
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::trajectory::{DEPTH_SPEED_RATIO_3D, Launch, Playback, Trajectory};
use crate::vector::{Tilt, project_perspective};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANGLE_DEG: f64 = 45.0;
pub const DEFAULT_SPEED: f64 = 20.0;
pub const DEFAULT_GRAVITY: f64 = 9.8;
pub const DEFAULT_AIR_RESISTANCE: f64 = 0.0;
/// Distance from the eye to the projection plane of the 3D view.
pub const PROJECTION_FOV: f64 = 500.0;

const MODEL: &str = "projectile";
const MODEL_3D: &str = "projectile-3d";

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("angle", "Launch angle", "deg", 0.0, 90.0, DEFAULT_ANGLE_DEG),
    ParamSpec::new("speed", "Launch speed", "m/s", 1.0, 100.0, DEFAULT_SPEED),
    ParamSpec::new("gravity", "Gravity", "m/s²", 0.1, 30.0, DEFAULT_GRAVITY),
    ParamSpec::new("air-resistance", "Air resistance", "N·s/m²", 0.0, 10.0, DEFAULT_AIR_RESISTANCE),
    SIM_SPEED,
];

pub const PARAMS_3D: &[ParamSpec] = &[
    ParamSpec::new("angle", "Launch angle", "deg", 0.0, 90.0, DEFAULT_ANGLE_DEG),
    ParamSpec::new("speed", "Launch speed", "m/s", 1.0, 100.0, DEFAULT_SPEED),
    ParamSpec::new("gravity", "Gravity", "m/s²", 0.1, 30.0, DEFAULT_GRAVITY),
    ParamSpec::new("air-resistance", "Air resistance", "N·s/m²", 0.0, 10.0, DEFAULT_AIR_RESISTANCE),
    SIM_SPEED,
    ParamSpec::new("tilt-x", "Tilt X", "deg", -180.0, 180.0, 0.0),
    ParamSpec::new("tilt-y", "Tilt Y", "deg", -180.0, 180.0, 0.0),
    ParamSpec::new("tilt-z", "Tilt Z", "deg", -180.0, 180.0, 0.0),
];

pub const FLAGS: &[FlagSpec] = &[FlagSpec {
    name: "show-peak",
    label: "Show peak",
    default: false,
}];

/// Launch controls. Edits apply to the next generated trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileParams {
    pub angle_deg: f64,
    pub speed: f64,
    pub gravity: f64,
    pub air_resistance: f64,
    /// Samples advanced per frame during playback.
    pub sim_speed: f64,
    pub tilt: Tilt,
}

impl Default for ProjectileParams {
    fn default() -> Self {
        Self {
            angle_deg: DEFAULT_ANGLE_DEG,
            speed: DEFAULT_SPEED,
            gravity: DEFAULT_GRAVITY,
            air_resistance: DEFAULT_AIR_RESISTANCE,
            sim_speed: super::DEFAULT_SIM_SPEED,
            tilt: Tilt::default(),
        }
    }
}

impl ProjectileParams {
    /// Copy with every control clamped into `specs`. Tilts are checked in
    /// degrees, as the sliders show them.
    pub fn sanitized(self, specs: &[ParamSpec]) -> Result<Self> {
        let tilt = |name, radians: f64| -> Result<f64> {
            Ok(sanitize(specs, name, radians.to_degrees())?.to_radians())
        };
        Ok(Self {
            angle_deg: sanitize(specs, "angle", self.angle_deg)?,
            speed: sanitize(specs, "speed", self.speed)?,
            gravity: sanitize(specs, "gravity", self.gravity)?,
            air_resistance: sanitize(specs, "air-resistance", self.air_resistance)?,
            sim_speed: sanitize(specs, "sim-speed", self.sim_speed)?,
            tilt: Tilt {
                x: tilt("tilt-x", self.tilt.x)?,
                y: tilt("tilt-y", self.tilt.y)?,
                z: tilt("tilt-z", self.tilt.z)?,
            },
        })
    }
}

/// Projectile demo: generate a trajectory, then play it back.
#[derive(Debug, Clone)]
pub struct ProjectileModel {
    params: ProjectileParams,
    depth: bool,
    trajectory: Trajectory,
    playback: Playback,
    /// The trajectory predates the current parameters and is regenerated on
    /// the next run.
    stale: bool,
    show_peak: bool,
}

impl ProjectileModel {
    pub fn new(params: ProjectileParams, depth: bool) -> Self {
        let trajectory = Trajectory::compute(launch_for(&params, depth));
        Self {
            params,
            depth,
            trajectory,
            playback: Playback::default(),
            stale: true,
            show_peak: false,
        }
    }

    pub fn planar() -> Self {
        Self::new(ProjectileParams::default(), false)
    }

    pub fn depth() -> Self {
        Self::new(ProjectileParams::default(), true)
    }

    fn id(&self) -> &'static str {
        if self.depth { MODEL_3D } else { MODEL }
    }

    pub fn params(&self) -> &ProjectileParams {
        &self.params
    }

    /// Replace every control; the next run starts a fresh trajectory.
    pub fn set_params(&mut self, params: ProjectileParams) -> Result<()> {
        self.params = params.sanitized(self.param_specs())?;
        self.stale = true;
        Ok(())
    }

    pub fn param_specs(&self) -> &'static [ParamSpec] {
        if self.depth { PARAMS_3D } else { PARAMS }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn current_index(&self) -> usize {
        self.playback.clamped_index(self.trajectory.len())
    }

    pub fn launch(&self) -> Launch {
        launch_for(&self.params, self.depth)
    }

    /// Recompute the trajectory from the current controls and rewind.
    pub fn generate(&mut self) {
        self.trajectory = Trajectory::compute(self.launch());
        self.playback.rewind();
        self.stale = false;
        log::info!(
            "{}: generated {} samples, range {:.2} m",
            self.id(),
            self.trajectory.len(),
            self.trajectory.range()
        );
    }

    /// A run resumes playback, or starts a fresh trajectory on the first run
    /// and whenever the last one has been played to the end.
    pub fn prepare_run(&mut self) -> Result<()> {
        if self.stale || self.playback.is_finished(self.trajectory.len()) {
            self.generate();
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.playback.rewind();
    }

    /// Playback is frame-driven: the cursor moves by the speed multiplier
    /// regardless of wall time.
    pub fn tick(&mut self, _dt: f64) -> TickOutcome {
        if self.playback.advance(self.params.sim_speed, self.trajectory.len()) {
            TickOutcome::Continue
        } else {
            TickOutcome::Halt(HaltReason::PlaybackFinished)
        }
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        let p = &mut self.params;
        match name {
            "angle" => p.angle_deg = value,
            "speed" => p.speed = value,
            "gravity" => p.gravity = value,
            "air-resistance" => p.air_resistance = value,
            "sim-speed" => p.sim_speed = value,
            "tilt-x" if self.depth => p.tilt.x = value.to_radians(),
            "tilt-y" if self.depth => p.tilt.y = value.to_radians(),
            "tilt-z" if self.depth => p.tilt.z = value.to_radians(),
            _ => {
                return Err(EngineError::UnknownParameter {
                    model: self.id(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<()> {
        match find_flag(FLAGS, name).map(|f| f.name) {
            Some("show-peak") => {
                self.show_peak = on;
                Ok(())
            }
            _ => Err(EngineError::UnknownFlag {
                model: self.id(),
                name: name.to_string(),
            }),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut d = Diagnostics::new();
        let index = self.current_index();
        let (Some(point), Some(stats)) = (self.trajectory.get(index), self.trajectory.stats_at(index))
        else {
            return d;
        };
        let group = "Projectile";
        d.push(group, "Mass", 1.0, "kg");
        d.push(group, "Time", point.t, "s");
        d.push(group, "Distance", point.position.x, "m");
        d.push(group, "Height", point.position.y, "m");
        if self.depth {
            d.push(group, "Depth", point.position.z, "m");
        }
        d.push(group, "Speed", stats.speed, "m/s");
        d.push(group, "Angle", stats.heading_deg, "deg");
        d.push("Energy", "GPE", stats.potential, "J");
        d.push("Energy", "KE", stats.kinetic, "J");
        d.push("Energy", "Total", stats.potential + stats.kinetic, "J");
        d.push("Energy", "Energy lost", stats.energy_lost, "J");
        if self.show_peak {
            if let Some(peak) = self.trajectory.peak_upto(index) {
                d.push("Peak", "Height", peak.position.y, "m");
                d.push("Peak", "Distance", peak.position.x, "m");
            }
        }
        if self.trajectory.landed() && index + 1 == self.trajectory.len() {
            d.push("Flight", "Range", self.trajectory.range(), "m");
            d.push("Flight", "Time of flight", point.t, "s");
        }
        d
    }

    fn view(&self, p: &crate::trajectory::TrajectoryPoint) -> nalgebra::Vector2<f64> {
        if self.depth {
            project_perspective(&p.position, &self.params.tilt, PROJECTION_FOV)
        } else {
            p.planar()
        }
    }

    pub fn scene(&self) -> Scene {
        let index = self.current_index();
        let peak = if self.show_peak {
            self.trajectory.peak_upto(index).map(|p| self.view(p))
        } else {
            None
        };
        Scene::Trajectory {
            path: self.trajectory.points().iter().map(|p| self.view(p)).collect(),
            current: index,
            peak,
        }
    }
}

fn launch_for(params: &ProjectileParams, depth: bool) -> Launch {
    Launch {
        depth_ratio: if depth { DEPTH_SPEED_RATIO_3D } else { 0.0 },
        ..Launch::planar(params.angle_deg, params.speed, params.gravity, params.air_resistance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_to_the_end_then_halts() {
        let mut model = ProjectileModel::planar();
        let len = model.trajectory().len();
        let mut frames = 0;
        while model.tick(0.016) == TickOutcome::Continue {
            frames += 1;
            assert!(frames <= len);
        }
        assert_eq!(model.current_index(), len - 1);
    }

    #[test]
    fn edits_apply_on_next_run_after_finishing() {
        let mut model = ProjectileModel::planar();
        let before = model.trajectory().range();
        model.set_param("speed", 30.0).unwrap();
        assert_eq!(model.trajectory().range(), before);

        while model.tick(0.016) == TickOutcome::Continue {}
        model.prepare_run().unwrap();
        assert!(model.trajectory().range() > before);
        assert_eq!(model.current_index(), 0);
    }

    #[test]
    fn first_run_uses_edits_made_before_it() {
        let mut model = ProjectileModel::planar();
        let default_range = model.trajectory().range();
        model.set_param("speed", 40.0).unwrap();
        model.prepare_run().unwrap();
        let expected = Trajectory::compute(Launch::planar(45.0, 40.0, DEFAULT_GRAVITY, 0.0));
        assert_eq!(model.trajectory().range(), expected.range());
        assert!(model.trajectory().range() > default_range);
    }

    #[test]
    fn loaded_params_are_clamped_and_regenerated() {
        let mut model = ProjectileModel::depth();
        model.prepare_run().unwrap();
        let params = ProjectileParams {
            speed: 500.0,
            tilt: Tilt::from_degrees(270.0, 0.0, 0.0),
            ..ProjectileParams::default()
        };
        model.set_params(params).unwrap();
        assert_eq!(model.params().speed, 100.0);
        assert!((model.params().tilt.x - std::f64::consts::PI).abs() < 1e-12);
        model.prepare_run().unwrap();
        assert_eq!(model.trajectory().launch().speed, 100.0);
    }

    #[test]
    fn non_finite_params_are_rejected() {
        let mut model = ProjectileModel::planar();
        let params = ProjectileParams {
            gravity: f64::NAN,
            ..ProjectileParams::default()
        };
        assert!(matches!(
            model.set_params(params),
            Err(EngineError::NonFiniteValue { .. })
        ));
        assert_eq!(model.params().gravity, DEFAULT_GRAVITY);
    }

    #[test]
    fn run_mid_playback_resumes() {
        let mut model = ProjectileModel::planar();
        model.prepare_run().unwrap();
        model.tick(0.016);
        model.tick(0.016);
        model.prepare_run().unwrap();
        assert_eq!(model.current_index(), 2);
    }

    #[test]
    fn tilt_only_on_depth_variant() {
        let mut planar = ProjectileModel::planar();
        assert!(planar.set_param("tilt-x", 10.0).is_err());
        let mut depth = ProjectileModel::depth();
        depth.set_param("tilt-x", 90.0).unwrap();
        assert!((depth.params().tilt.x - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn peak_marker_follows_flag() {
        let mut model = ProjectileModel::planar();
        for _ in 0..5 {
            model.tick(0.016);
        }
        let Scene::Trajectory { peak, .. } = model.scene() else {
            panic!("wrong scene");
        };
        assert!(peak.is_none());
        model.set_flag("show-peak", true).unwrap();
        let Scene::Trajectory { peak, current, path } = model.scene() else {
            panic!("wrong scene");
        };
        assert_eq!(peak, Some(path[current]));
        assert!(model.diagnostics().get_in("Peak", "Height").is_some());
    }

    #[test]
    fn depth_variant_reports_depth() {
        let model = ProjectileModel::depth();
        assert!(model.trajectory().last().unwrap().position.z > 0.0);
        assert!(model.diagnostics().get("Depth").is_some());
    }
}
