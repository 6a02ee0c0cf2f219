use kinelab::{Diagnostics, Engine, Scene, TickOutcome, model_catalog};

/// Frames per demo when running headless.
const FRAMES: usize = 600;
const FRAME_MS: f64 = 16.0;

fn describe(scene: &Scene) -> String {
    match scene {
        Scene::Trajectory { path, current, .. } => match path.get(*current) {
            Some(p) => format!("ball at ({:.2}, {:.2})", p.x, p.y),
            None => "empty trajectory".to_string(),
        },
        Scene::Pendulum { bobs } => match bobs.last() {
            Some(b) => format!("{} bobs, last at ({:.2}, {:.2})", bobs.len(), b.x, b.y),
            None => "no bobs".to_string(),
        },
        Scene::Blocks {
            moving, stationary, ..
        } => format!("blocks at {:.1} and {:.1} px", moving.x, stationary.x),
        Scene::Springs { mass, anchors } => format!(
            "mass at ({:.2}, {:.2}) on {} springs",
            mass.x,
            mass.y,
            anchors.len()
        ),
        Scene::RotatingSpring { length, broken, .. } => {
            format!("spring length {:.2} m{}", length, if *broken { " (broken)" } else { "" })
        }
    }
}

fn main() {
    env_logger::init();

    for info in model_catalog() {
        let mut engine = match Engine::new(info.id) {
            Ok(e) => e,
            Err(e) => {
                eprintln!("{}: {}", info.id, e);
                continue;
            }
        };
        if let Err(e) = engine.run() {
            eprintln!("{}: {}", info.id, e);
            continue;
        }

        println!("== {} ==", info.name);
        let mut last_scene = String::new();
        let mut last_panel = Diagnostics::new();
        let mut frames = 0;
        for i in 0..FRAMES {
            let outcome = engine.frame(
                i as f64 * FRAME_MS,
                &mut |s: &Scene| last_scene = describe(s),
                &mut |d: &Diagnostics| last_panel = d.clone(),
            );
            frames = i + 1;
            match outcome {
                Some(TickOutcome::Continue) => {}
                Some(other) => {
                    println!("stopped after {} frames: {:?}", frames, other);
                    break;
                }
                None => break,
            }
        }
        println!("{} frames, {}", frames, last_scene);
        print!("{}", last_panel);
        println!();
    }
}
