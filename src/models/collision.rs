use super::{FlagSpec, ParamSpec, Scene, TickOutcome, SIM_SPEED, sanitize};
use crate::collision::{Block, Bounds, CollisionPair};
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::forces::{driven_acceleration, step_driven_velocity};
use serde::{Deserialize, Serialize};

pub const WALL_THICKNESS: f64 = 10.0;
pub const DEFAULT_WORLD_WIDTH: f64 = 1000.0;
pub const STATIONARY_START_X: f64 = 200.0;
/// The moving block starts this far in from the far edge...
pub const MOVING_START_INSET: f64 = 150.0;
/// ...or at least this far clear of the stationary block.
pub const START_GAP: f64 = 50.0;

pub const DEFAULT_STATIONARY_MASS: f64 = 100.0;
pub const DEFAULT_MOVING_MASS: f64 = 50.0;
pub const DEFAULT_SPEED: f64 = 3.0;
pub const DEFAULT_FORCE: f64 = 200.0;
pub const DEFAULT_FRICTION: f64 = 0.1;

const MODEL: &str = "collision";

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("stationary-mass", "Stationary block mass", "kg", 1.0, 400.0, DEFAULT_STATIONARY_MASS),
    ParamSpec::new("moving-mass", "Moving block mass", "kg", 1.0, 400.0, DEFAULT_MOVING_MASS),
    ParamSpec::new("speed", "Initial speed", "m/s", 0.1, 10.0, DEFAULT_SPEED),
    ParamSpec::new("force", "Driving force", "N", 0.0, 1000.0, DEFAULT_FORCE),
    ParamSpec::new("friction", "Friction coefficient", "", 0.0, 1.0, DEFAULT_FRICTION),
    SIM_SPEED,
];

pub const FLAGS: &[FlagSpec] = &[FlagSpec {
    name: "force",
    label: "Driving force",
    default: false,
}];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionParams {
    pub stationary_mass: f64,
    pub moving_mass: f64,
    /// Magnitude of the moving block's starting speed (it starts leftward).
    pub speed: f64,
    pub force: f64,
    pub friction: f64,
    pub force_enabled: bool,
    pub sim_speed: f64,
    /// Right edge of the world (px).
    pub world_width: f64,
}

impl Default for CollisionParams {
    fn default() -> Self {
        Self {
            stationary_mass: DEFAULT_STATIONARY_MASS,
            moving_mass: DEFAULT_MOVING_MASS,
            speed: DEFAULT_SPEED,
            force: DEFAULT_FORCE,
            friction: DEFAULT_FRICTION,
            force_enabled: false,
            sim_speed: super::DEFAULT_SIM_SPEED,
            world_width: DEFAULT_WORLD_WIDTH,
        }
    }
}

impl CollisionParams {
    /// Copy with every slider value clamped; the world width only has to be
    /// finite.
    pub fn sanitized(self) -> Result<Self> {
        Ok(Self {
            stationary_mass: sanitize(PARAMS, "stationary-mass", self.stationary_mass)?,
            moving_mass: sanitize(PARAMS, "moving-mass", self.moving_mass)?,
            speed: sanitize(PARAMS, "speed", self.speed)?,
            force: sanitize(PARAMS, "force", self.force)?,
            friction: sanitize(PARAMS, "friction", self.friction)?,
            force_enabled: self.force_enabled,
            sim_speed: sanitize(PARAMS, "sim-speed", self.sim_speed)?,
            world_width: sanitize(PARAMS, "world-width", self.world_width)?,
        })
    }
}

/// Starting layout for the given parameters.
pub fn initial_pair(params: &CollisionParams) -> CollisionPair {
    let stationary = Block::new(STATIONARY_START_X, 0.0, params.stationary_mass);
    let mut moving = Block::new(0.0, -params.speed, params.moving_mass);
    moving.x = (params.world_width - MOVING_START_INSET)
        .max(stationary.right() + moving.half_width() + START_GAP);
    let bounds = Bounds {
        wall: WALL_THICKNESS,
        far: params.world_width,
    };
    CollisionPair::new(moving, stationary, bounds)
}

/// Block collision demo.
#[derive(Debug, Clone)]
pub struct CollisionModel {
    params: CollisionParams,
    pair: CollisionPair,
}

impl Default for CollisionModel {
    fn default() -> Self {
        Self::new(CollisionParams::default())
    }
}

impl CollisionModel {
    pub fn new(params: CollisionParams) -> Self {
        Self {
            pair: initial_pair(&params),
            params,
        }
    }

    pub fn params(&self) -> &CollisionParams {
        &self.params
    }

    /// Replace every parameter at once; the layout restarts.
    pub fn set_params(&mut self, params: CollisionParams) -> Result<()> {
        self.params = params.sanitized()?;
        self.reset();
        Ok(())
    }

    pub fn pair(&self) -> &CollisionPair {
        &self.pair
    }

    pub fn prepare_run(&mut self) -> Result<()> {
        Ok(())
    }

    pub fn reset(&mut self) {
        self.pair = initial_pair(&self.params);
    }

    fn refresh_acceleration(&mut self) {
        let b = &mut self.pair.moving;
        b.a = driven_acceleration(b.v, self.params.force, self.params.friction, b.mass);
    }

    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        let dt = dt * self.params.sim_speed;
        if self.params.force_enabled {
            let b = &mut self.pair.moving;
            let (v, a) = step_driven_velocity(b.v, self.params.force, self.params.friction, b.mass, dt);
            b.v = v;
            b.a = a;
        }
        let events = self.pair.step(dt);
        if events.far_stop {
            log::info!(
                "{}: stationary block reached the far edge after {} collisions",
                MODEL,
                self.pair.collision_count()
            );
            return TickOutcome::Reset;
        }
        TickOutcome::Continue
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "stationary-mass" => {
                self.params.stationary_mass = value;
                self.reset();
            }
            "moving-mass" => {
                self.params.moving_mass = value;
                self.reset();
            }
            "speed" => {
                self.params.speed = value;
                self.reset();
            }
            "force" => {
                self.params.force = value;
                if self.params.force_enabled {
                    self.refresh_acceleration();
                }
            }
            "friction" => {
                self.params.friction = value;
                if self.params.force_enabled {
                    self.refresh_acceleration();
                }
            }
            "sim-speed" => self.params.sim_speed = value,
            _ => {
                return Err(EngineError::UnknownParameter {
                    model: MODEL,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Turning the force off restores the configured speed in the current
    /// direction of travel.
    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<()> {
        if name != "force" {
            return Err(EngineError::UnknownFlag {
                model: MODEL,
                name: name.to_string(),
            });
        }
        self.params.force_enabled = on;
        if on {
            self.refresh_acceleration();
        } else {
            let b = &mut self.pair.moving;
            b.a = 0.0;
            b.v = if b.v < 0.0 {
                -self.params.speed
            } else {
                self.params.speed
            };
        }
        Ok(())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut d = Diagnostics::new();
        for (group, b) in [
            ("Moving Block", &self.pair.moving),
            ("Stationary Block", &self.pair.stationary),
        ] {
            d.push(group, "Position", b.x, "px");
            d.push(group, "Velocity", b.v, "m/s");
            d.push(group, "Mass", b.mass, "kg");
            d.push(group, "Size", b.size(), "px");
            d.push(group, "KE", b.kinetic_energy(), "J");
        }
        d.push("Total", "KE", self.pair.total_kinetic(), "J");
        d.push("Total", "Momentum", self.pair.total_momentum(), "kg·m/s");
        d.push("Total", "Collisions", self.pair.collision_count() as f64, "");
        if self.params.force_enabled {
            d.push("Mode", "Force", self.params.force, "N");
            d.push("Mode", "Acceleration", self.pair.moving.a, "m/s²");
        } else {
            d.note("force off: constant speed");
        }
        d
    }

    pub fn scene(&self) -> Scene {
        Scene::Blocks {
            bounds: self.pair.bounds,
            moving: self.pair.moving,
            stationary: self.pair.stationary,
            moving_size: self.pair.moving.size(),
            stationary_size: self.pair.stationary.size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_layout() {
        let model = CollisionModel::default();
        let pair = model.pair();
        assert_eq!(pair.stationary.x, 200.0);
        assert_eq!(pair.moving.x, 850.0);
        assert_eq!(pair.moving.v, -3.0);
        assert!(!pair.overlapping());
    }

    #[test]
    fn heavy_blocks_start_clear_of_each_other() {
        let params = CollisionParams {
            stationary_mass: 400.0,
            moving_mass: 400.0,
            world_width: 400.0,
            ..CollisionParams::default()
        };
        let pair = initial_pair(&params);
        assert_abs_diff_eq!(pair.moving.left() - pair.stationary.right(), START_GAP, epsilon = 1e-9);
    }

    #[test]
    fn loaded_params_are_checked() {
        let mut model = CollisionModel::default();
        let bad = CollisionParams {
            speed: f64::INFINITY,
            ..CollisionParams::default()
        };
        assert!(matches!(
            model.set_params(bad),
            Err(EngineError::NonFiniteValue { .. })
        ));
        assert!(model.set_params(CollisionParams {
            world_width: f64::NAN,
            ..CollisionParams::default()
        })
        .is_err());
        assert_eq!(model.params(), &CollisionParams::default());

        model
            .set_params(CollisionParams {
                moving_mass: 0.0,
                friction: 3.0,
                ..CollisionParams::default()
            })
            .unwrap();
        assert_eq!(model.params().moving_mass, 1.0);
        assert_eq!(model.params().friction, 1.0);
        assert_eq!(model.pair().moving.mass, 1.0);
    }

    #[test]
    fn mass_edit_resets() {
        let mut model = CollisionModel::default();
        for _ in 0..20 {
            model.tick(0.016);
        }
        model.set_param("moving-mass", 25.0).unwrap();
        assert_eq!(model.pair().moving.v, -3.0);
        assert_eq!(model.pair().collision_count(), 0);
        assert_eq!(model.pair().moving.mass, 25.0);
    }

    #[test]
    fn force_toggle_round_trip_restores_speed() {
        let mut model = CollisionModel::default();
        model.set_flag("force", true).unwrap();
        // pushing left with friction opposing: (-200 + 0.1·50·9.81) / 50
        assert_abs_diff_eq!(model.pair().moving.a, (-200.0 + 49.05) / 50.0, epsilon = 1e-9);
        for _ in 0..10 {
            model.tick(0.016);
        }
        assert!(model.pair().moving.v < -3.0);
        model.set_flag("force", false).unwrap();
        assert_eq!(model.pair().moving.v, -3.0);
        assert_eq!(model.pair().moving.a, 0.0);
    }

    #[test]
    fn conserves_momentum_through_first_collision() {
        let mut model = CollisionModel::default();
        let p0 = model.pair().total_momentum();
        let ke0 = model.pair().total_kinetic();
        while model.pair().collision_count() == 0 {
            assert_eq!(model.tick(0.016), TickOutcome::Continue);
        }
        assert_abs_diff_eq!(model.pair().total_momentum(), p0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.pair().total_kinetic(), ke0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.pair().moving.v, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(model.pair().stationary.v, -2.0, epsilon = 1e-12);
    }
}
