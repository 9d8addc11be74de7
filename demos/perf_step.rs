use std::collections::HashMap;
use std::time::Instant;

use glam::Vec2;
use gridsat::resolution;
use gridsat::*;
use tracing_subscriber::EnvFilter;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let parallel = std::env::args().all(|a| a != "--sequential");
    let mut world = CollisionWorld::new(WorldConfig {
        cell_size: 4.0,
        parallel,
        enable_timing: true,
    });

    let n = 20_000u32; // colliders
    let steps = 5;
    let mask = TagMask::new(1, 1);
    let mut seed = 1u32;
    let mut bodies: HashMap<EntityId, Body> = (0..n)
        .map(|i| {
            let p = Vec2::new(unit(&mut seed) * 400.0 - 200.0, unit(&mut seed) * 400.0 - 200.0);
            (i, Body { position: p, force: Vec2::ZERO })
        })
        .collect();
    for i in (0..n).step_by(4) {
        world.set_resolution_mode(i, ResolutionMode::MoveOut);
    }

    for step in 0..steps {
        let t0 = Instant::now();
        world.begin_step();
        for i in 0..n {
            let p = bodies[&i].position;
            if i % 2 == 0 {
                world.push(ShapeSnapshot::rect(i, i, p, Vec2::splat(0.5), mask));
            } else {
                world.push_circle(i, i, p, 0.5, mask);
            }
        }
        let corrections = world.step();
        resolution::apply(&corrections, &mut bodies);
        let wall = t0.elapsed();

        let s = world.stats();
        match world.timing() {
            Some(t) => println!(
                "step={} N={} cell_size={} parallel={} detect={:.3}ms (partition={:.3}ms broad={:.3}ms narrow={:.3}ms) resolve={:.3}ms cells={} candidates={} contacts={} new={} corrections={}",
                step,
                n,
                world.cfg.cell_size,
                parallel,
                t.detect_ms,
                t.partition_ms,
                t.broadphase_ms,
                t.narrowphase_ms,
                t.resolve_ms,
                s.cells,
                s.candidates,
                s.contacts,
                s.new_contacts,
                corrections.len()
            ),
            None => println!(
                "step={} N={} wall={:?} candidates={} contacts={}",
                step, n, wall, s.candidates, s.contacts
            ),
        }
    }
}
