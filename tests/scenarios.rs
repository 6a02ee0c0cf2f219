use approx::assert_abs_diff_eq;
use kinelab::engine::{MAX_ELAPSED_DT, MODEL_COLLISION, MODEL_PENDULUM, MODEL_PROJECTILE, MODEL_ROTATING_SPRING};
use kinelab::models::FRAME_DT;
use kinelab::models::collision::CollisionModel;
use kinelab::models::pendulum::PendulumModel;
use kinelab::pendulum::{PendulumChain, PendulumParams};
use kinelab::trajectory::{Launch, TRAJECTORY_DT, Trajectory};
use kinelab::{Engine, EngineError, HaltReason, Scene, TickOutcome, TickPolicy};

fn agm(mut a: f64, mut b: f64) -> f64 {
    while (a - b).abs() > 1e-15 * a {
        (a, b) = (0.5 * (a + b), (a * b).sqrt());
    }
    a
}

#[test]
fn drag_free_range_matches_closed_form_within_one_step() {
    for angle in [15.0, 30.0, 45.0, 60.0, 75.0] {
        let launch = Launch::planar(angle, 20.0, 9.81, 0.0);
        let traj = Trajectory::compute(launch);
        assert!(traj.landed());
        let exact = 20.0f64.powi(2) * (2.0 * angle.to_radians()).sin() / 9.81;
        let vx = 20.0 * angle.to_radians().cos();
        assert!(traj.range() >= exact - 1e-9, "angle {}", angle);
        assert!(traj.range() <= exact + vx * TRAJECTORY_DT + 1e-9, "angle {}", angle);
    }
}

#[test]
fn projectile_playback_is_deterministic() {
    let mut a = Engine::new(MODEL_PROJECTILE).unwrap();
    let mut b = Engine::new(MODEL_PROJECTILE).unwrap();
    for e in [&mut a, &mut b] {
        e.set_param("angle", 30.0).unwrap();
        e.set_param("air-resistance", 0.5).unwrap();
        e.run().unwrap();
        for i in 0..12 {
            e.advance(i as f64 * 16.0);
        }
    }
    assert_eq!(a.scene(), b.scene());
    assert_eq!(a.diagnostics(), b.diagnostics());

    let expected = Trajectory::compute(Launch::planar(30.0, 20.0, 9.8, 0.5));
    let Scene::Trajectory { path, .. } = a.scene() else {
        panic!("wrong scene");
    };
    assert_eq!(path.len(), expected.len());
    assert_eq!(path.last().map(|p| p.x), Some(expected.range()));
}

#[test]
fn first_run_plays_the_edited_launch() {
    let mut engine = Engine::new(MODEL_PROJECTILE).unwrap();
    engine.set_param("speed", 40.0).unwrap();
    engine.run().unwrap();
    let expected = Trajectory::compute(Launch::planar(45.0, 40.0, 9.8, 0.0));
    let Scene::Trajectory { path, .. } = engine.scene() else {
        panic!("wrong scene");
    };
    assert_eq!(path.last().map(|p| p.x), Some(expected.range()));
}

#[test]
fn pendulum_period_matches_elliptic_integral() {
    let (g, length) = (9.8, 10.0);
    let theta0 = 45f64.to_radians();
    let params = PendulumParams {
        gravity: g,
        damping: 0.0,
        real_physics: true,
    };
    let mut chain = PendulumChain::default();
    chain.set_start_angle(0, theta0).unwrap();
    chain.set_length(0, length).unwrap();

    // times at which theta changes sign, linearly interpolated
    let mut crossings = Vec::new();
    let mut t = 0.0;
    let mut prev = chain.segments()[0].theta;
    while crossings.len() < 3 {
        chain.step(&params, FRAME_DT);
        t += FRAME_DT;
        let theta = chain.segments()[0].theta;
        if prev.signum() != theta.signum() {
            crossings.push(t - FRAME_DT * theta / (theta - prev));
        }
        prev = theta;
    }

    let exact = 2.0 * std::f64::consts::PI * (length / g).sqrt() / agm(1.0, (theta0 / 2.0).cos());
    let measured = crossings[2] - crossings[0];
    assert_abs_diff_eq!(measured, exact, epsilon = 0.02);
}

#[test]
fn simple_mode_drifts_more_than_rk4() {
    let g = 9.8;
    let max_drift = |real_physics: bool| {
        let params = PendulumParams {
            gravity: g,
            damping: 0.0,
            real_physics,
        };
        let mut chain = PendulumChain::default();
        let e0 = chain.display_energy(g);
        let mut worst: f64 = 0.0;
        for _ in 0..625 {
            chain.step(&params, FRAME_DT);
            worst = worst.max(((chain.display_energy(g) - e0) / e0).abs());
        }
        worst
    };
    let euler = max_drift(false);
    let rk4 = max_drift(true);
    assert!(euler < 0.05, "euler drift {}", euler);
    assert!(rk4 < euler, "rk4 {} vs euler {}", rk4, euler);
    assert!(rk4 < 1e-4, "rk4 drift {}", rk4);
}

#[test]
fn pendulum_segments_cascade_through_the_engine() {
    let mut engine = Engine::new(MODEL_PENDULUM).unwrap();
    let bobs = |e: &Engine| match e.scene() {
        Scene::Pendulum { bobs } => bobs.len(),
        other => panic!("unexpected scene {:?}", other),
    };
    assert_eq!(bobs(&engine), 1);
    assert!(matches!(
        engine.set_flag("segment-3", true),
        Err(EngineError::SegmentOrder { .. })
    ));
    engine.set_flag("segment-2", true).unwrap();
    engine.set_flag("segment-3", true).unwrap();
    assert_eq!(bobs(&engine), 3);
    engine.set_segment(2, false).unwrap();
    assert_eq!(bobs(&engine), 1);
    assert!(engine.set_segment(1, false).is_err());
}

#[test]
fn collision_energy_is_conserved_until_the_far_stop() {
    let mut model = CollisionModel::default();
    let ke0 = model.pair().total_kinetic();
    let mut collisions = 0;
    for _ in 0..20_000 {
        match model.tick(FRAME_DT) {
            TickOutcome::Continue => {
                assert_abs_diff_eq!(model.pair().total_kinetic(), ke0, epsilon = 1e-6);
                assert!(!model.pair().overlapping());
                collisions = model.pair().collision_count();
            }
            _ => break,
        }
    }
    assert!(collisions >= 2);
}

#[test]
fn collision_engine_resets_and_stops_at_the_far_edge() {
    let mut engine = Engine::new(MODEL_COLLISION).unwrap();
    engine.set_param("speed", 10.0).unwrap();
    engine.set_param("sim-speed", 5.0).unwrap();
    let start = engine.scene();
    engine.run().unwrap();
    let mut t = 0.0;
    let mut frames = 0;
    while engine.is_running() && frames < 100_000 {
        t += 16.0;
        engine.advance(t);
        frames += 1;
    }
    assert!(!engine.is_running());
    assert_eq!(engine.scene(), start);
}

#[test]
fn rotating_spring_breaks_at_the_critical_speed() {
    let mut engine = Engine::new(MODEL_ROTATING_SPRING).unwrap();
    // in the slider range, then capped just below sqrt(k/m) by the model
    engine.set_param("angular-speed", 10.0).unwrap();
    engine.set_flag("terminal-speed", true).unwrap();
    let omega = engine.diagnostics().get("Angular Speed").unwrap();
    assert_abs_diff_eq!(omega, 0.99 * 5f64.sqrt(), epsilon = 1e-12);
    engine.run().unwrap();
    assert_eq!(engine.advance(0.0), Some(TickOutcome::Continue));

    engine.set_param("stiffness", 2.0).unwrap();
    assert_eq!(
        engine.advance(16.0),
        Some(TickOutcome::Halt(HaltReason::SpringBroken))
    );
    assert!(!engine.is_running());
    assert!(matches!(engine.run(), Err(EngineError::WouldBreak { .. })));

    engine.set_param("stiffness", 20.0).unwrap();
    engine.reset();
    engine.run().unwrap();
}

#[test]
fn elapsed_policy_clamps_long_frames() {
    let mut engine = Engine::new(MODEL_PENDULUM).unwrap();
    engine.set_tick_policy(TickPolicy::Elapsed {
        max_dt: MAX_ELAPSED_DT,
    });
    let at_rest = engine.scene();
    engine.run().unwrap();
    engine.advance(1_000.0);
    assert_eq!(engine.scene(), at_rest);
    engine.advance(9_000.0);

    let mut reference = PendulumModel::default();
    reference.tick(MAX_ELAPSED_DT);
    assert_eq!(engine.scene(), reference.scene());
}
